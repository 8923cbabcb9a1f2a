//! Blocking phase notifications and the timed phase cycler for the
//! Signalbox traffic light.
//!
//! A [`LightController`] runs a background [`PhaseCycler`] thread that
//! toggles between Red and Green every few seconds. Each toggle updates an
//! atomic [`PhaseState`] snapshot and pushes the new phase onto a
//! [`BlockingQueue`], where threads blocked in
//! [`LightController::wait_for_green`] pick it up.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `signalbox-config.yaml`.
//! - [`cycler`] -- The timer loop that performs transitions.
//! - [`light`] -- [`LightController`], the public surface.
//! - [`phase`] -- Atomic phase snapshot.
//! - [`queue`] -- Generic mutex/condvar handoff queue.
//! - [`stop`] -- Stop latch with an interruptible wait.
//! - [`timing`] -- Randomized hold interval.
//!
//! [`LightController`]: light::LightController
//! [`LightController::wait_for_green`]: light::LightController::wait_for_green
//! [`PhaseCycler`]: cycler::PhaseCycler
//! [`PhaseState`]: phase::PhaseState
//! [`BlockingQueue`]: queue::BlockingQueue

pub mod config;
pub mod cycler;
pub mod light;
pub mod phase;
pub mod queue;
pub mod stop;
pub mod timing;
