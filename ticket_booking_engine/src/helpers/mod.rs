mod bounded_call;

pub use bounded_call::{bounded_call, call_with_deadline, Deadline};
