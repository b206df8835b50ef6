//! Core of a tabular data editor: a row store with sorting, search and
//! pagination, a validated edit buffer, a column registry, CSV import/export
//! and persisted session state. Everything changes through [`model::Model::update`].

pub mod columns;
pub mod controller;
pub mod csv_io;
pub mod domain;
pub mod edits;
pub mod field;
pub mod logging;
pub mod model;
pub mod persist;
pub mod table;
pub mod ui;
pub mod validator;
pub mod view;
