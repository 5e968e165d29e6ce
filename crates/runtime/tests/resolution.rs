mod common;

use std::time::Duration;

use combat_core::{AttackCommand, EffectKind, Issuer, Location, TargetingMode};
use combat_runtime::{
    ChannelSelector, CombatEvent, Event, Participant, ParticipantBuilder, SequenceOutcome, Topic,
};
use tokio::sync::broadcast;
use tokio::time::Instant;

use common::{drain, loc, oracles};

async fn skirmish() -> Participant {
    skirmish_with(Participant::builder()).await
}

async fn skirmish_with(builder: ParticipantBuilder) -> Participant {
    let participant = builder.oracles(oracles()).build().await.unwrap();
    for slot in ["HostileFront1", "HostileFront2", "HostileMid1"] {
        participant
            .spawn_enemy_or_ally(loc(slot), "goblin", false, 0)
            .await
            .unwrap();
    }
    participant
        .spawn_enemy_or_ally(loc("FriendlyFront1"), "squire", true, 0)
        .await
        .unwrap();
    participant
}

fn sweep() -> AttackCommand {
    AttackCommand::new(
        "Cleave",
        TargetingMode::AllHostile,
        EffectKind::Damage,
        Issuer::Player,
        loc("FriendlyFront1"),
    )
    .with_fixed_amount(3)
}

fn player_command(name: &str, targeting: TargetingMode) -> AttackCommand {
    AttackCommand::new(
        name,
        targeting,
        EffectKind::Damage,
        Issuer::Player,
        loc("FriendlyFront1"),
    )
    .with_fixed_amount(3)
}

/// Waits until the resolver offers candidates to the selector.
async fn offered(combat: &mut broadcast::Receiver<Event>) -> Vec<Location> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(Event::Combat(CombatEvent::CandidatesOffered { candidates, .. })) =
                combat.recv().await
            {
                return candidates;
            }
        }
    })
    .await
    .expect("candidates offered")
}

fn hit_targets(events: &[Event]) -> Vec<Location> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Combat(CombatEvent::HitApplied { target, .. }) => Some(target.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test(start_paused = true)]
async fn sweep_hits_in_reverse_order_at_the_long_pace() {
    let participant = skirmish().await;
    let mut combat = participant.handle().subscribe(Topic::Combat);

    let started = Instant::now();
    let outcome = participant.resolve(sweep()).await.unwrap();
    participant.flush().await.unwrap();

    assert_eq!(outcome, SequenceOutcome::Completed { hits: 3 });
    assert!(started.elapsed() >= Duration::from_millis(1800));
    assert_eq!(
        hit_targets(&drain(&mut combat)),
        vec![loc("HostileMid1"), loc("HostileFront2"), loc("HostileFront1")]
    );

    let state = participant.handle().query_state().await.unwrap();
    for slot in ["HostileFront1", "HostileFront2", "HostileMid1"] {
        assert_eq!(state.battlefield.occupant(&loc(slot)).unwrap().health, 10);
    }

    participant.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn new_sequence_preempts_the_running_one() {
    let participant = skirmish().await;
    let mut combat = participant.handle().subscribe(Topic::Combat);

    let resolver = participant.resolver();
    let first = tokio::spawn(async move { resolver.resolve(sweep()).await });

    tokio::time::sleep(Duration::from_millis(700)).await;
    let strike = AttackCommand::new(
        "Strike",
        TargetingMode::PreChosen,
        EffectKind::Damage,
        Issuer::Player,
        loc("FriendlyFront1"),
    )
    .with_fixed_amount(6)
    .with_target(loc("HostileFront1"));
    let second = participant.resolve(strike).await.unwrap();
    let first = first.await.unwrap().unwrap();
    participant.flush().await.unwrap();

    assert_eq!(first, SequenceOutcome::Cancelled);
    assert_eq!(second, SequenceOutcome::Completed { hits: 1 });
    assert!(!participant.resolver().is_busy().await);

    let events = drain(&mut combat);
    assert_eq!(
        hit_targets(&events),
        vec![loc("HostileMid1"), loc("HostileFront1")]
    );
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Combat(CombatEvent::SequenceCancelled { name }) if name == "Cleave"
    )));

    let state = participant.handle().query_state().await.unwrap();
    assert_eq!(state.battlefield.occupant(&loc("HostileFront1")).unwrap().health, 7);
    assert_eq!(state.battlefield.occupant(&loc("HostileFront2")).unwrap().health, 12);

    participant.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn sweep_with_nobody_left_reports_no_targets() {
    let participant = Participant::builder()
        .oracles(oracles())
        .build()
        .await
        .unwrap();
    participant
        .spawn_enemy_or_ally(loc("FriendlyFront1"), "squire", true, 0)
        .await
        .unwrap();

    let outcome = participant.resolve(sweep()).await.unwrap();
    assert_eq!(outcome, SequenceOutcome::NoTargets);

    participant.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn preempted_before_the_first_hit_costs_no_action_points() {
    let participant = skirmish().await;
    let before = participant.handle().query_state().await.unwrap();
    let squire = before.battlefield.occupant(&loc("FriendlyFront1")).unwrap();
    let (squire_id, ap_before) = (squire.id, squire.action_points);
    assert!(ap_before > 0);

    let resolver = participant.resolver();
    let first = tokio::spawn(async move { resolver.resolve(sweep().with_action(1, 1)).await });

    // Well inside the first 600 ms hit delay.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let passive = AttackCommand::new(
        "Taunt",
        TargetingMode::PreChosen,
        EffectKind::Damage,
        Issuer::Player,
        Location::none(),
    )
    .with_target(loc("HostileFront1"));
    participant.resolve(passive).await.unwrap();

    assert_eq!(first.await.unwrap().unwrap(), SequenceOutcome::Cancelled);
    participant.flush().await.unwrap();

    let after = participant.handle().query_state().await.unwrap();
    assert_eq!(
        after.battlefield.character(squire_id).unwrap().action_points,
        ap_before
    );
    assert_eq!(after.battlefield.occupant(&loc("HostileMid1")).unwrap().health, 12);

    participant.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn selector_choice_outside_the_candidates_is_ignored() {
    let (selector, choices) = ChannelSelector::channel(4);
    let participant = skirmish_with(Participant::builder().target_selector(selector)).await;
    let mut combat = participant.handle().subscribe(Topic::Combat);

    let resolver = participant.resolver();
    let pending = tokio::spawn(async move {
        resolver
            .resolve(player_command("Jab", TargetingMode::AnyHostile))
            .await
    });

    let candidates = offered(&mut combat).await;
    assert_eq!(candidates.len(), 3);
    assert!(!candidates.contains(&loc("FriendlyMid1")));

    choices.send(loc("FriendlyMid1")).await.unwrap();
    choices.send(loc("HostileFront2")).await.unwrap();

    let outcome = pending.await.unwrap().unwrap();
    participant.flush().await.unwrap();
    assert_eq!(outcome, SequenceOutcome::Completed { hits: 1 });
    assert_eq!(hit_targets(&drain(&mut combat)), vec![loc("HostileFront2")]);

    let state = participant.handle().query_state().await.unwrap();
    assert_eq!(state.battlefield.occupant(&loc("HostileFront2")).unwrap().health, 10);
    assert_eq!(state.battlefield.occupant(&loc("HostileFront1")).unwrap().health, 12);

    participant.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn relocation_moves_the_attacker() {
    let (selector, choices) = ChannelSelector::channel(4);
    let participant = skirmish_with(Participant::builder().target_selector(selector)).await;
    let mut combat = participant.handle().subscribe(Topic::Combat);
    choices.send(loc("FriendlyBack2")).await.unwrap();

    let outcome = participant
        .resolve(player_command("Reposition", TargetingMode::Relocation))
        .await
        .unwrap();
    participant.flush().await.unwrap();

    assert_eq!(
        outcome,
        SequenceOutcome::Relocated {
            to: loc("FriendlyBack2")
        }
    );
    let events = drain(&mut combat);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Combat(CombatEvent::Moved { from, to })
            if *from == loc("FriendlyFront1") && *to == loc("FriendlyBack2")
    )));
    assert!(hit_targets(&events).is_empty());

    let state = participant.handle().query_state().await.unwrap();
    assert!(state.battlefield.occupant(&loc("FriendlyFront1")).is_none());
    assert_eq!(
        state.battlefield.occupant(&loc("FriendlyBack2")).unwrap().archetype.as_deref(),
        Some("squire")
    );

    participant.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancelling_while_awaiting_a_choice() {
    let (selector, _choices) = ChannelSelector::channel(4);
    let participant = skirmish_with(Participant::builder().target_selector(selector)).await;
    let mut combat = participant.handle().subscribe(Topic::Combat);

    let resolver = participant.resolver();
    let pending = tokio::spawn(async move {
        resolver
            .resolve(player_command("Jab", TargetingMode::AnyHostile).with_action(1, 1))
            .await
    });
    offered(&mut combat).await;
    assert!(participant.resolver().is_busy().await);

    participant.resolver().cancel().await;

    assert_eq!(pending.await.unwrap().unwrap(), SequenceOutcome::Cancelled);
    participant.flush().await.unwrap();
    let events = drain(&mut combat);
    assert!(events.iter().any(|e| matches!(
        e,
        Event::Combat(CombatEvent::SequenceCancelled { name }) if name == "Jab"
    )));
    assert!(!events
        .iter()
        .any(|e| matches!(e, Event::Combat(CombatEvent::ActionUsed { .. }))));
    assert!(!participant.resolver().is_busy().await);

    participant.shutdown().await.unwrap();
}
