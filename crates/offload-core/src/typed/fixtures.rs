//! Fixtures - unit test 共通の Task 型と Handler

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::handler::Handler;
use super::task::Task;
use crate::domain::errors::TaskError;
use crate::sandbox::TaskArg;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scale(pub i64);

impl Task for Scale {
    const TYPE: &'static str = "test.scale.v1";
}

/// Multiplies by 1000.
pub struct ScaleHandler;

#[async_trait]
impl Handler<Scale> for ScaleHandler {
    async fn handle(&self, arg: TaskArg<Scale>) -> Result<(), TaskError> {
        arg.completed(arg.data.0 * 1000);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    pub steps: u64,
}

impl Task for Countdown {
    const TYPE: &'static str = "test.countdown.v1";
}

/// Reports `1..=steps` then completes with `"done"`.
pub struct CountdownHandler;

#[async_trait]
impl Handler<Countdown> for CountdownHandler {
    async fn handle(&self, arg: TaskArg<Countdown>) -> Result<(), TaskError> {
        for step in 1..=arg.data.steps {
            arg.report_progress(step);
            tokio::task::yield_now().await;
        }
        arg.completed("done");
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explode;

impl Task for Explode {
    const TYPE: &'static str = "test.explode.v1";
}

/// Fails without reporting anything itself.
pub struct ExplodeHandler;

#[async_trait]
impl Handler<Explode> for ExplodeHandler {
    async fn handle(&self, _arg: TaskArg<Explode>) -> Result<(), TaskError> {
        Err(TaskError::execution("x"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kaboom;

impl Task for Kaboom {
    const TYPE: &'static str = "test.kaboom.v1";
}

pub struct KaboomHandler;

#[async_trait]
impl Handler<Kaboom> for KaboomHandler {
    async fn handle(&self, _arg: TaskArg<Kaboom>) -> Result<(), TaskError> {
        panic!("kaboom");
    }
}
