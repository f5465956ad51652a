pub mod email;

pub use email::{Attachment, Delivery, EmailClient, EmailError};
