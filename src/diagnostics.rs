//! Where failed sends are reported

use crate::Error;

/// Receives the failures of plain SMTP sends
///
/// Called once per failed [`send`](crate::MailSender::send), right before the
/// error is returned. Failures over implicit TLS are only returned.
pub trait DiagnosticSink {
    fn send_failed(&self, error: &Error);
}

/// Emits one `tracing` error event per failure
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn send_failed(&self, error: &Error) {
        tracing::error!("mail send error: {error}");
    }
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for &T {
    fn send_failed(&self, error: &Error) {
        (**self).send_failed(error)
    }
}

#[cfg(test)]
mod test {
    use std::cell::RefCell;

    use super::{DiagnosticSink, TracingSink};
    use crate::error;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<String>>);

    impl DiagnosticSink for Recorder {
        fn send_failed(&self, error: &crate::Error) {
            self.0.borrow_mut().push(error.to_string());
        }
    }

    #[test]
    fn test_borrowed_sink() {
        let recorder = Recorder::default();
        let sink = &recorder;

        sink.send_failed(&error::envelope("no recipients"));
        assert_eq!(
            *recorder.0.borrow(),
            ["invalid envelope: no recipients".to_owned()]
        );
    }

    #[test]
    fn test_tracing_sink() {
        let _guard = tracing::subscriber::set_default(tracing_subscriber::fmt().finish());
        TracingSink.send_failed(&error::envelope("no recipients"));
    }
}
