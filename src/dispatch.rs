//! Runs gateway calls off the UI thread and posts the replies back as events.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use tracing::{debug, trace};

use crate::api::{
    ApiError, ApiGateway, AuthToken, Credentials, OptionKey, PdfId, PdfSummary, Question,
    QuestionId, StatsSummary, SubmitOutcome, SubmitRequest,
};
use crate::auth::AuthMode;
use crate::quiz::SessionId;
use crate::runtime::AppEvent;

/// Reply to a dispatched request, tagged with whatever it was issued for
#[derive(Debug)]
pub enum ApiReply {
    Authenticated {
        mode: AuthMode,
        result: Result<AuthToken, ApiError>,
    },
    // `token` is the one the request was issued with, so replies that
    // outlive a sign-out can be recognised
    Pdfs {
        token: AuthToken,
        result: Result<Vec<PdfSummary>, ApiError>,
    },
    Deleted {
        token: AuthToken,
        pdf_id: PdfId,
        result: Result<(), ApiError>,
    },
    UploadProgress(u8),
    Uploaded {
        token: AuthToken,
        result: Result<PdfSummary, ApiError>,
    },
    Questions {
        session: SessionId,
        result: Result<Vec<Question>, ApiError>,
    },
    Submitted {
        session: SessionId,
        question_id: QuestionId,
        selected: OptionKey,
        result: Result<SubmitOutcome, ApiError>,
    },
    Stats {
        token: AuthToken,
        pdf_id: PdfId,
        result: Result<StatsSummary, ApiError>,
    },
}

#[derive(Clone)]
pub struct Dispatcher {
    gateway: Arc<dyn ApiGateway>,
    tx: Sender<AppEvent>,
}

impl Dispatcher {
    pub fn new(gateway: Arc<dyn ApiGateway>, tx: Sender<AppEvent>) -> Self {
        Self { gateway, tx }
    }

    fn spawn<F>(&self, what: &'static str, job: F)
    where
        F: FnOnce(&dyn ApiGateway) -> ApiReply + Send + 'static,
    {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        debug!(request = what, "dispatching");
        thread::spawn(move || {
            let reply = job(gateway.as_ref());
            trace!(request = what, "reply ready");
            // the receiver is gone once the app has quit
            let _ = tx.send(AppEvent::Api(reply));
        });
    }

    pub fn authenticate(&self, mode: AuthMode, credentials: Credentials) {
        self.spawn("authenticate", move |gw| {
            let result = match mode {
                AuthMode::Login => gw.login(&credentials),
                AuthMode::Register => gw.register(&credentials),
            };
            ApiReply::Authenticated { mode, result }
        });
    }

    pub fn list_pdfs(&self, token: AuthToken) {
        self.spawn("list_pdfs", move |gw| {
            let result = gw.list_pdfs(&token);
            ApiReply::Pdfs { token, result }
        });
    }

    pub fn delete_pdf(&self, token: AuthToken, pdf_id: PdfId) {
        self.spawn("delete_pdf", move |gw| {
            let result = gw.delete_pdf(&token, pdf_id);
            ApiReply::Deleted {
                token,
                pdf_id,
                result,
            }
        });
    }

    pub fn upload_pdf(&self, token: AuthToken, path: PathBuf) {
        let progress_tx = self.tx.clone();
        self.spawn("upload_pdf", move |gw| {
            let progress = Box::new(move |percent: u8| {
                let _ = progress_tx.send(AppEvent::Api(ApiReply::UploadProgress(percent)));
            });
            let result = gw.upload_pdf(&token, &path, progress);
            ApiReply::Uploaded { token, result }
        });
    }

    pub fn fetch_questions(&self, token: AuthToken, session: SessionId, pdf_id: PdfId, limit: usize) {
        self.spawn("fetch_questions", move |gw| ApiReply::Questions {
            session,
            result: gw.fetch_questions(&token, pdf_id, limit),
        });
    }

    pub fn submit_answer(&self, token: AuthToken, session: SessionId, request: SubmitRequest) {
        self.spawn("submit_answer", move |gw| ApiReply::Submitted {
            session,
            question_id: request.question_id,
            selected: request.selected,
            result: gw.submit_answer(&token, &request),
        });
    }

    pub fn fetch_stats(&self, token: AuthToken, pdf_id: PdfId) {
        self.spawn("fetch_stats", move |gw| {
            let result = gw.fetch_stats(&token, pdf_id);
            ApiReply::Stats {
                token,
                pdf_id,
                result,
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ProgressFn;
    use std::path::Path;
    use std::sync::mpsc;
    use std::time::Duration;
    use uuid::Uuid;

    struct Offline;

    impl ApiGateway for Offline {
        fn login(&self, _: &Credentials) -> Result<AuthToken, ApiError> {
            Ok(AuthToken::new("login-token"))
        }
        fn register(&self, _: &Credentials) -> Result<AuthToken, ApiError> {
            Err(ApiError::Status {
                status: 400,
                detail: Some("Email already registered".into()),
            })
        }
        fn list_pdfs(&self, _: &AuthToken) -> Result<Vec<PdfSummary>, ApiError> {
            Err(ApiError::Transport("offline".into()))
        }
        fn delete_pdf(&self, _: &AuthToken, _: PdfId) -> Result<(), ApiError> {
            Ok(())
        }
        fn upload_pdf(
            &self,
            _: &AuthToken,
            _: &Path,
            mut progress: ProgressFn,
        ) -> Result<PdfSummary, ApiError> {
            progress(50);
            progress(100);
            Err(ApiError::Transport("offline".into()))
        }
        fn fetch_questions(&self, _: &AuthToken, _: PdfId, _: usize) -> Result<Vec<Question>, ApiError> {
            Ok(vec![])
        }
        fn submit_answer(&self, _: &AuthToken, r: &SubmitRequest) -> Result<SubmitOutcome, ApiError> {
            Ok(SubmitOutcome {
                is_correct: true,
                correct_answer: r.selected,
                explanation: String::new(),
            })
        }
        fn fetch_stats(&self, _: &AuthToken, _: PdfId) -> Result<StatsSummary, ApiError> {
            Err(ApiError::Transport("offline".into()))
        }
    }

    fn recv(rx: &mpsc::Receiver<AppEvent>) -> ApiReply {
        match rx.recv_timeout(Duration::from_secs(5)).expect("reply") {
            AppEvent::Api(reply) => reply,
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn replies_come_back_as_events() {
        let (tx, rx) = mpsc::channel();
        let dispatcher = Dispatcher::new(Arc::new(Offline), tx);

        dispatcher.authenticate(
            AuthMode::Login,
            Credentials {
                email: "a@b.c".into(),
                password: "pw".into(),
            },
        );
        match recv(&rx) {
            ApiReply::Authenticated { mode, result } => {
                assert_eq!(mode, AuthMode::Login);
                assert_eq!(result.unwrap(), AuthToken::new("login-token"));
            }
            other => panic!("unexpected reply {other:?}"),
        }

        dispatcher.list_pdfs(AuthToken::new("t"));
        match recv(&rx) {
            ApiReply::Pdfs { token, result } => {
                assert_eq!(token, AuthToken::new("t"));
                assert!(result.is_err());
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn submission_reply_carries_its_question() {
        let (tx, rx) = mpsc::channel();
        let dispatcher = Dispatcher::new(Arc::new(Offline), tx);
        let session = crate::quiz::QuizSession::loading(Uuid::nil()).id();
        let question_id = Uuid::from_u128(42);

        dispatcher.submit_answer(
            AuthToken::new("t"),
            session,
            SubmitRequest {
                question_id,
                selected: OptionKey::C,
            },
        );
        match recv(&rx) {
            ApiReply::Submitted {
                session: s,
                question_id: q,
                selected,
                result,
            } => {
                assert_eq!(s, session);
                assert_eq!(q, question_id);
                assert_eq!(selected, OptionKey::C);
                assert!(result.unwrap().is_correct);
            }
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn upload_reports_progress_before_result() {
        let (tx, rx) = mpsc::channel();
        let dispatcher = Dispatcher::new(Arc::new(Offline), tx);
        dispatcher.upload_pdf(AuthToken::new("t"), PathBuf::from("x.pdf"));

        assert!(matches!(recv(&rx), ApiReply::UploadProgress(50)));
        assert!(matches!(recv(&rx), ApiReply::UploadProgress(100)));
        assert!(matches!(recv(&rx), ApiReply::Uploaded { result: Err(_), .. }));
    }
}
