mod establishment;
mod feedback;
mod user;

pub use establishment::*;
pub use feedback::*;
pub use user::*;
