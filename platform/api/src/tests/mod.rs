mod api;
mod database;
