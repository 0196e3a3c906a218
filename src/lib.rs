//! # SiteChat
//!
//! A chatbot trained on a website's own pages.
//!
//! SiteChat discovers a site's pages (sitemap first, home-page links
//! otherwise), strips and chunks their text into an in-memory store, and
//! answers questions by keyword overlap. Answers are extracted sentences,
//! or, when an OpenRouter key is configured, a model completion over the
//! retrieved chunks.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌───────────────┐
//! │ Crawler  │──▶│ Trainer  │──▶│ DocumentStore │
//! │ sitemap/ │   │ strip +  │   │  in-memory    │
//! │  links   │   │  chunk   │   └───────┬───────┘
//! └──────────┘   └──────────┘           │
//!                     ▲                 ▼
//!              ┌──────┴─────┐    ┌─────────────┐    ┌────────────────────┐
//!              │ local dir  │    │ QueryRouter │──▶│ responder/generator│
//!              └────────────┘    └──────┬──────┘    └────────────────────┘
//!                                       │
//!                            ┌──────────┴──────────┐
//!                            ▼                     ▼
//!                       ┌─────────┐          ┌──────────┐
//!                       │   CLI   │          │   HTTP   │
//!                       └─────────┘          └──────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`models`] | Core data types |
//! | [`error`] | Typed fetch, sitemap, and generation errors |
//! | [`site`] | Source normalization and site references in questions |
//! | [`markup`] | HTML to plain text |
//! | [`chunk`] | Fixed-size text chunking |
//! | [`store`] | In-memory chunk store and keyword search |
//! | [`fetch`] | Browser-like HTTP client |
//! | [`sitemap`] | `sitemap.xml` parsing |
//! | [`crawler`] | Bounded page discovery |
//! | [`trainer`] | Website training |
//! | [`connector_fs`] | Local-directory training |
//! | [`responder`] | Extractive answers |
//! | [`generator`] | Optional remote answers |
//! | [`router`] | Question dispatch |
//! | [`server`] | HTTP API |

pub mod chunk;
pub mod config;
pub mod connector_fs;
pub mod crawler;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod markup;
pub mod models;
pub mod responder;
pub mod router;
pub mod server;
pub mod site;
pub mod sitemap;
pub mod store;
pub mod trainer;
