//! `vellum`: the document service for the vector design canvas.
//!
//! | Module     | Role                                              |
//! |------------|---------------------------------------------------|
//! | `config`   | Environment-driven settings                       |
//! | `db`       | Postgres pool and embedded migrations             |
//! | `routes`   | Axum router and HTTP handlers                     |
//! | `services` | Document create/list/load/save over either store  |
//! | `state`    | Shared state handed to handlers                   |

pub mod config;
pub mod db;
pub mod routes;
pub mod services;
pub mod state;
