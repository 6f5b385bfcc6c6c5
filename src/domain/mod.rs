mod establishment;
mod establishment_name;
mod feedback;
mod new_password;
mod rating;
mod slug;
mod subscription_status;
mod user;
mod user_email;

pub use establishment::{Establishment, EstablishmentChanges, NewEstablishment};
pub use establishment_name::EstablishmentName;
pub use feedback::{Feedback, FeedbackFilter, NewFeedback};
pub use new_password::NewPassword;
pub use rating::Rating;
pub use slug::generate_slug;
pub use subscription_status::SubscriptionStatus;
pub use user::{NewUser, SubscriptionUpdate, User};
pub use user_email::UserEmail;
