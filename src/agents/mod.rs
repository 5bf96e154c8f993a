// src/agents/mod.rs
// Common Agent trait and agent modules.

use crate::error::SimulatorError;
use crate::messages::{AgentId, Message, SimulatorApi};

pub mod exchange_agent;
pub mod human_agent;
pub mod noise_trader_agent;
pub mod oracle_agent;

/// Core trait every participant in the simulation implements. Dispatch is
/// always through `Box<dyn Agent>` in the kernel's arena — there is no open
/// hierarchy of agent base classes to extend.
///
/// A `Err` return from any handler is fatal: the kernel stops the run and
/// surfaces the error to its caller. Only the exchange agent is expected to
/// ever return one, on a crossed-book invariant violation.
pub trait Agent {
    fn id(&self) -> AgentId;
    fn name(&self) -> &str;

    /// Lets external collaborators (the kernel's `book_snapshot` accessor)
    /// downcast to a concrete agent type without the `Agent` trait itself
    /// growing exchange-specific methods.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Called once, before `on_start`, with a kernel reference the agent may
    /// stash id/config from. Most agents don't need it.
    fn on_attach(&mut self, _sim: &mut dyn SimulatorApi) -> Result<(), SimulatorError> {
        Ok(())
    }

    /// Called once at simulation start, after every agent has been attached.
    fn on_start(&mut self, _sim: &mut dyn SimulatorApi) -> Result<(), SimulatorError> {
        Ok(())
    }

    /// Called when simulation ends.
    fn on_stop(&mut self, _sim: &mut dyn SimulatorApi) -> Result<(), SimulatorError> {
        Ok(())
    }

    /// Called when a wakeup event reaches this agent. `now_ns` is the
    /// simulation time for this wakeup.
    fn on_wakeup(&mut self, _sim: &mut dyn SimulatorApi, _now_ns: u64) -> Result<(), SimulatorError> {
        Ok(())
    }

    /// Called when a message is delivered to this agent.
    fn on_message(&mut self, _sim: &mut dyn SimulatorApi, _msg: &Message) -> Result<(), SimulatorError> {
        Ok(())
    }
}
