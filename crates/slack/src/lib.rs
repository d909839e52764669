//! Slack HTTP integration
//!
//! This crate holds everything between a Slack HTTP callback and a bot:
//! - **Payloads** (`payload`) - form and query extraction per route
//! - **Verification** (`verify`) - verification-token comparison
//! - **Commands** (`commands`) - normalization of slash commands and message actions
//! - **Gateway** (`gateway`) - verify, parse, dispatch and format in one pass
//! - **Responses** (`responder`, `blocks`) - platform response rendering
//! - **Install** (`install`) - "Add to Slack" OAuth landing and redirect
//!
//! # Architecture
//!
//! ```text
//! HTTP form → SlackRequest → tokens_match → CommandParser → BotHandler
//!                                                              ↓
//!                               PlatformResponse ← Responder ← Reply
//! ```
//!
//! The gateway never touches HTTP types. The server crate adapts
//! [`responder::PlatformResponse`] and [`install::InstallRedirect`] into
//! framework responses.

pub mod blocks;
pub mod commands;
pub mod gateway;
pub mod install;
pub mod payload;
pub mod responder;
pub mod verify;

pub use gateway::{BotError, BotHandler, EchoBot, ErrorLogger, SlackGateway, TracingErrorLogger};
pub use install::{HttpTokenExchanger, InstallError, InstallFlow, InstallRedirect, TokenExchanger};
pub use payload::{Route, SlackRequest};
pub use responder::{PlatformResponse, Reply, Responder, SlackResponder};
