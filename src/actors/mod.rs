//! Actor-based monitoring core
//!
//! Each actor runs as an independent async task communicating via Tokio channels.
//!
//! ## Architecture Overview
//!
//! ```text
//!                 ┌──────────────────┐
//!                 │  SchedulerActor  │── tick ──▶ probe task × N targets
//!                 └────────┬─────────┘                 │
//!                          │ summary tick              │ record
//!                          │                  ┌────────▼────────┐
//!                          │                  │   ResultStore   │
//!                          │                  └────────┬────────┘
//!                          ▼ try_send                  │ try_send
//!                 ┌──────────────────────────────────────────────┐
//!                 │      bounded mpsc event channel (drop-if-full)│
//!                 └────────────────────┬─────────────────────────┘
//!                                      │
//!                            ┌─────────▼─────────┐
//!                            │ BroadcasterActor  │
//!                            └─────────┬─────────┘
//!                     spawn per subscriber delivery
//!              ┌───────────────────────┼───────────────────────┐
//!        ┌─────▼─────┐           ┌─────▼─────┐           ┌─────▼─────┐
//!        │ viewer A  │           │ viewer B  │           │ viewer N  │
//!        └───────────┘           └───────────┘           └───────────┘
//! ```
//!
//! ## Actor Types
//!
//! - **SchedulerActor**: Launches probe rounds and periodic summaries
//! - **BroadcasterActor**: Delivers every event to every registered viewer
//!
//! ## Communication Patterns
//!
//! 1. **Commands**: The scheduler has an mpsc command channel for control messages
//! 2. **Events**: Outcomes and summaries travel over one bounded mpsc channel
//! 3. **Request/Response**: oneshot channels for synchronous queries
//! 4. **State**: Scheduler lifecycle is exposed through a watch channel

pub mod broadcaster;
pub mod messages;
pub mod scheduler;
