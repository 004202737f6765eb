/// One-shot transient message surface (toast). Display failures are the
/// implementor's business; callers never hear about them.
pub trait Notifier {
    fn notify(&self, message: &str);
}

impl<F: Fn(&str)> Notifier for F {
    fn notify(&self, message: &str) {
        self(message)
    }
}
