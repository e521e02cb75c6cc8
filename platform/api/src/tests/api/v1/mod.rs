mod auth;
mod celebrities;
mod client;
mod health;
mod images;
