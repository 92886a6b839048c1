pub(crate) mod ascii;
pub(crate) mod bootstrap;
pub(crate) mod loop_runner;
pub(crate) mod pacing;
pub(crate) mod script;
