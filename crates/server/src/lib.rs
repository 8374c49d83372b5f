pub mod errors;
pub mod event;
pub mod dispatcher;
pub mod routes;
pub mod startup;

pub use dispatcher::Dispatcher;
pub use event::{Envelope, HttpEvent};
pub use startup::run;
