//! The watcher-supervisor-merger pipeline that ties the `seismo-*` crates
//! together into a running collector: build watchers from config, restart
//! stopped ones on a tick, fan their streams into one, and persist.

pub mod config;
pub mod factory;
pub mod merger;
pub mod supervisor;
