mod cron;
mod establishments;
mod feedback;
mod helpers;
mod stripe_checkout;
mod stripe_webhook;
