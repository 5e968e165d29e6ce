//! Attack resolution sequencer.
//!
//! [`AttackResolver`] turns an [`AttackCommand`] into a paced series of
//! `DeliverAttack` dispatches. Targets are planned on a state snapshot, every
//! hit is rolled here (on the issuing participant) and relayed finalized, so
//! recipients never roll. At most one sequence runs at a time; starting a new
//! one pre-empts the old one.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use combat_core::{
    AttackCommand, DiceRoller, GameCommand, GameError, Location, TargetPlan, TargetingMode,
    finalize_hit, plan_targets,
};

use crate::api::{ParticipantHandle, Result, TargetSelector};
use crate::cancel::CancelToken;
use crate::clock::Clock;
use crate::config::SequenceTiming;
use crate::events::CombatEvent;
use crate::relay::CommandDispatcher;

/// How a resolution sequence ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SequenceOutcome {
    /// Hits were dispatched; some may have been skipped on application.
    Completed { hits: usize },
    /// A relocation was dispatched instead of hits.
    Relocated { to: Location },
    /// Nothing was eligible.
    NoTargets,
    /// The attacker was missing or no valid choice was made.
    Abandoned,
    /// Pre-empted by a newer sequence.
    Cancelled,
}

struct ResolverInner {
    dispatcher: Arc<dyn CommandDispatcher>,
    handle: ParticipantHandle,
    selector: Arc<dyn TargetSelector>,
    clock: Arc<dyn Clock>,
    timing: SequenceTiming,
    crit_ceiling: u32,
    roller: Mutex<DiceRoller>,
    active: Mutex<Option<CancelToken>>,
}

/// Cloneable single-flight attack sequencer.
#[derive(Clone)]
pub struct AttackResolver {
    inner: Arc<ResolverInner>,
}

impl AttackResolver {
    pub(crate) fn new(
        dispatcher: Arc<dyn CommandDispatcher>,
        handle: ParticipantHandle,
        selector: Arc<dyn TargetSelector>,
        clock: Arc<dyn Clock>,
        timing: SequenceTiming,
        crit_ceiling: u32,
        roller: DiceRoller,
    ) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                dispatcher,
                handle,
                selector,
                clock,
                timing,
                crit_ceiling,
                roller: Mutex::new(roller),
                active: Mutex::new(None),
            }),
        }
    }

    /// True while a sequence is running.
    pub async fn is_busy(&self) -> bool {
        self.inner.active.lock().await.is_some()
    }

    /// Cancels the running sequence, if any.
    pub async fn cancel(&self) {
        if let Some(token) = self.inner.active.lock().await.take() {
            token.cancel();
        }
    }

    /// Resolves `command`, pre-empting any running sequence.
    ///
    /// # Errors
    ///
    /// Fails when the participant worker is gone or the relay refuses a
    /// command; nothing dispatched before the failure is rolled back.
    pub async fn resolve(&self, command: AttackCommand) -> Result<SequenceOutcome> {
        let inner = &self.inner;
        let token = CancelToken::new();

        let previous = inner.active.lock().await.replace(token.clone());
        if let Some(previous) = previous {
            debug!(name = command.name.as_str(), "pre-empting running sequence");
            previous.cancel();
            if !token.pause(inner.clock.as_ref(), inner.timing.settle()).await {
                return Ok(self.cancelled(&command));
            }
        }

        let outcome = self.run(&command, &token).await;

        {
            let mut active = inner.active.lock().await;
            if active.as_ref().is_some_and(|t| t.id() == token.id()) {
                *active = None;
            }
        }

        match outcome {
            Ok(SequenceOutcome::Cancelled) => Ok(self.cancelled(&command)),
            Ok(outcome) => {
                if let SequenceOutcome::Completed { hits } = outcome {
                    inner.handle.event_bus().publish(CombatEvent::SequenceCompleted {
                        name: command.name.clone(),
                        hits,
                    });
                }
                Ok(outcome)
            }
            Err(e) => Err(e),
        }
    }

    fn cancelled(&self, command: &AttackCommand) -> SequenceOutcome {
        warn!(name = command.name.as_str(), "attack sequence cancelled");
        self.inner
            .handle
            .event_bus()
            .publish(CombatEvent::SequenceCancelled {
                name: command.name.clone(),
            });
        SequenceOutcome::Cancelled
    }

    async fn run(&self, command: &AttackCommand, token: &CancelToken) -> Result<SequenceOutcome> {
        let inner = &self.inner;
        let events = inner.handle.event_bus();
        events.publish(CombatEvent::HighlightsCleared);
        events.publish(CombatEvent::SequenceStarted {
            name: command.name.clone(),
            attacker: command.attacker.clone(),
        });

        let state = inner.handle.query_state().await?;
        let plan = {
            let mut roller = inner.roller.lock().await;
            plan_targets(&state.battlefield, command, &mut roller)
        };
        let plan = match plan {
            Ok(plan) => plan,
            Err(e) => {
                warn!(
                    name = command.name.as_str(),
                    code = e.error_code(),
                    "attack abandoned: {}",
                    e
                );
                return Ok(SequenceOutcome::Abandoned);
            }
        };

        let (targets, sweep) = match plan {
            TargetPlan::NoTargets => {
                debug!(name = command.name.as_str(), "no eligible targets");
                return Ok(SequenceOutcome::NoTargets);
            }
            TargetPlan::AwaitSelection { candidates } => {
                let Some(choice) = self.await_choice(command, candidates, token).await? else {
                    return Ok(if token.is_cancelled() {
                        SequenceOutcome::Cancelled
                    } else {
                        SequenceOutcome::Abandoned
                    });
                };
                if command.targeting == TargetingMode::Relocation {
                    return self.relocate(command, choice, token).await;
                }
                (vec![choice], false)
            }
            plan @ TargetPlan::Strike { .. } => (plan.application_order(), plan.is_sweep()),
        };

        let delay = inner.timing.hit_delay(sweep);
        let mut hits = 0;
        for target in targets {
            if !token.pause(inner.clock.as_ref(), delay).await || token.is_cancelled() {
                return Ok(SequenceOutcome::Cancelled);
            }
            if hits == 0 {
                self.notify_action_used(command).await?;
            }
            let hit = {
                let mut roller = inner.roller.lock().await;
                finalize_hit(
                    &command.clone().with_target(target),
                    &mut roller,
                    inner.crit_ceiling,
                )
            };
            debug!(
                name = hit.name.as_str(),
                target = hit.target.as_str(),
                amount = hit.resolved_damage,
                critical = hit.critical,
                "delivering hit"
            );
            inner
                .dispatcher
                .dispatch(GameCommand::DeliverAttack(hit))
                .await?;
            hits += 1;
        }

        info!(name = command.name.as_str(), hits, sweep, "attack sequence finished");
        Ok(SequenceOutcome::Completed { hits })
    }

    /// Publishes the candidates and waits for a valid choice.
    async fn await_choice(
        &self,
        command: &AttackCommand,
        candidates: Vec<Location>,
        token: &CancelToken,
    ) -> Result<Option<Location>> {
        self.inner
            .handle
            .event_bus()
            .publish(CombatEvent::CandidatesOffered {
                attacker: command.attacker.clone(),
                candidates: candidates.clone(),
            });

        let choice = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(None),
            choice = self.inner.selector.select(command, &candidates) => choice,
        };

        match choice {
            Some(choice) if candidates.contains(&choice) => Ok(Some(choice)),
            Some(choice) => {
                warn!(choice = choice.as_str(), "selection outside the candidates ignored");
                Ok(None)
            }
            None => {
                debug!(name = command.name.as_str(), "selection abandoned");
                Ok(None)
            }
        }
    }

    async fn relocate(
        &self,
        command: &AttackCommand,
        to: Location,
        token: &CancelToken,
    ) -> Result<SequenceOutcome> {
        if token.is_cancelled() {
            return Ok(SequenceOutcome::Cancelled);
        }
        self.notify_action_used(command).await?;
        self.inner
            .dispatcher
            .dispatch(GameCommand::MoveCharacter {
                from: command.attacker.clone(),
                to: to.clone(),
            })
            .await?;
        Ok(SequenceOutcome::Relocated { to })
    }

    /// Charges the action's cost; attacker-less effects cost nothing.
    async fn notify_action_used(&self, command: &AttackCommand) -> Result<()> {
        if command.attacker.is_none() {
            return Ok(());
        }
        self.inner
            .dispatcher
            .dispatch(GameCommand::NotifyActionUsed(command.clone()))
            .await
    }
}
