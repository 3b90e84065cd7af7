pub(crate) mod bootstrap;
mod input_script;
pub(crate) mod loop_runner;
mod save;
mod screens;
