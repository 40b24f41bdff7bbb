mod app;
mod persistence;
mod render;

pub(crate) use app::run;
