mod common;

use std::time::Duration;

use combat_core::{
    AttackCommand, EffectKind, GameCommand, Issuer, Location, PlayerId, RoundOutcome,
    TargetingMode, TurnPhase,
};
use combat_runtime::{CombatEvent, Event, Participant, RuntimeConfig, Topic, TurnEvent};

use common::{drain, loc, next_round, oracles};

#[tokio::test(start_paused = true)]
async fn advance_turn_counts_up() {
    let participant = Participant::builder()
        .oracles(oracles())
        .build()
        .await
        .unwrap();

    for _ in 0..5 {
        participant.dispatch(GameCommand::AdvanceTurn).await.unwrap();
    }
    participant.flush().await.unwrap();

    let state = participant.handle().query_state().await.unwrap();
    assert_eq!(state.turn.turn, 5);
    assert_eq!(participant.handle().applied_seq(), 5);

    participant.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn round_result_is_announced_once() {
    println!("🚀 Starting round latch test");
    let participant = Participant::builder()
        .oracles(oracles())
        .local_player(PlayerId::new("ana"))
        .build()
        .await
        .unwrap();
    let mut turns = participant.handle().subscribe(Topic::Turn);

    println!("📦 Setting up the encounter...");
    participant.dispatch(GameCommand::SelectQuest(0)).await.unwrap();
    participant
        .spawn_player(loc("FriendlyFront1"), PlayerId::new("ana"), "squire")
        .await
        .unwrap();
    participant
        .spawn_enemy_or_ally(loc("HostileFront1"), "goblin", false, 0)
        .await
        .unwrap();
    participant
        .dispatch(GameCommand::AllReadyForCombatStart)
        .await
        .unwrap();

    println!("⚔️  Delivering the finishing blow...");
    let blow = AttackCommand::new(
        "Strike",
        TargetingMode::PreChosen,
        EffectKind::Damage,
        Issuer::Player,
        loc("FriendlyFront1"),
    )
    .with_fixed_amount(50)
    .with_target(loc("HostileFront1"));
    participant
        .dispatch(GameCommand::DeliverAttack(blow))
        .await
        .unwrap();

    let outcome = next_round(&mut turns).await;
    assert_eq!(
        outcome,
        RoundOutcome::WaveCleared {
            next_wave: 2,
            next_is_boss: Some(true),
        }
    );

    println!("🔁 Checking the result does not repeat...");
    tokio::time::sleep(Duration::from_secs(5)).await;
    participant.flush().await.unwrap();
    let repeats = drain(&mut turns)
        .into_iter()
        .filter(|e| matches!(e, Event::Turn(TurnEvent::RoundResolved { .. })))
        .count();
    assert_eq!(repeats, 0);

    let state = participant.handle().query_state().await.unwrap();
    assert!(state.turn.game_ended);
    assert!(!state.turn.in_combat);
    assert_eq!(state.turn.wave, 2);
    assert!(state.turn.boss_wave);

    participant.shutdown().await.unwrap();
    println!("✅ Round latch test passed");
}

#[tokio::test(start_paused = true)]
async fn missing_local_player_is_reported_on_turn_advance() {
    let participant = Participant::builder()
        .oracles(oracles())
        .local_player(PlayerId::new("ana"))
        .build()
        .await
        .unwrap();
    let mut turns = participant.handle().subscribe(Topic::Turn);

    participant.dispatch(GameCommand::SelectQuest(0)).await.unwrap();
    participant.spawn_wave(0, 1).await.unwrap();
    participant
        .dispatch(GameCommand::AllReadyForCombatStart)
        .await
        .unwrap();

    let player = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            if let Ok(Event::Turn(TurnEvent::LocalPlayerMissing { player, .. })) =
                turns.recv().await
            {
                return player;
            }
        }
    })
    .await
    .expect("missing player reported");
    assert_eq!(player.as_str(), "ana");

    participant.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn ai_only_encounter_plays_to_completion() {
    println!("🚀 Starting AI-only encounter");
    let participant = Participant::builder()
        .oracles(oracles())
        .build()
        .await
        .unwrap();
    let mut turns = participant.handle().subscribe(Topic::Turn);

    participant.dispatch(GameCommand::SelectQuest(0)).await.unwrap();
    let spawned = participant.spawn_wave(0, 1).await.unwrap();
    assert_eq!(spawned.len(), 2);
    participant
        .dispatch(GameCommand::AllReadyForCombatStart)
        .await
        .unwrap();

    println!("⏳ Waiting for the round to resolve...");
    let outcome = next_round(&mut turns).await;
    println!("🏁 Round resolved: {:?}", outcome);

    let state = participant.handle().query_state().await.unwrap();
    assert!(state.turn.game_ended);
    assert_eq!(state.turn.outcome, Some(outcome));
    match outcome {
        RoundOutcome::WaveCleared { next_wave, .. } => {
            assert_eq!(next_wave, 2);
            assert!(!state.battlefield.roster.has_hostiles());
        }
        RoundOutcome::Defeat => assert!(!state.battlefield.roster.has_friendlies()),
    }

    participant.shutdown().await.unwrap();
    println!("✅ AI-only encounter passed");
}

fn finishing_blow(attacker: &str, target: &str, issuer: Issuer) -> GameCommand {
    GameCommand::DeliverAttack(
        AttackCommand::new(
            "Finisher",
            TargetingMode::PreChosen,
            EffectKind::Damage,
            issuer,
            Location::from(attacker),
        )
        .with_fixed_amount(100)
        .with_target(loc(target)),
    )
}

#[tokio::test(start_paused = true)]
async fn wiped_party_is_a_defeat() {
    let participant = Participant::builder()
        .oracles(oracles())
        .local_player(PlayerId::new("ana"))
        .build()
        .await
        .unwrap();
    let mut turns = participant.handle().subscribe(Topic::Turn);

    participant.dispatch(GameCommand::SelectQuest(0)).await.unwrap();
    participant
        .spawn_player(loc("FriendlyFront1"), PlayerId::new("ana"), "squire")
        .await
        .unwrap();
    participant
        .spawn_enemy_or_ally(loc("HostileFront1"), "goblin", false, 0)
        .await
        .unwrap();
    participant
        .dispatch(GameCommand::AllReadyForCombatStart)
        .await
        .unwrap();

    participant
        .dispatch(finishing_blow("HostileFront1", "FriendlyFront1", Issuer::Ai))
        .await
        .unwrap();

    assert_eq!(next_round(&mut turns).await, RoundOutcome::Defeat);
    let state = participant.handle().query_state().await.unwrap();
    assert_eq!(state.turn.phase(), TurnPhase::GameOver);
    assert_eq!(state.turn.wave, 1);
    assert!(state.battlefield.roster.has_hostiles());

    participant.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn fallen_local_player_forfeits_through_the_relay() {
    println!("🚀 Starting forfeit test");
    let participant = Participant::builder()
        .oracles(oracles())
        .local_player(PlayerId::new("ana"))
        .build()
        .await
        .unwrap();
    let mut turns = participant.handle().subscribe(Topic::Turn);
    let mut combat = participant.handle().subscribe(Topic::Combat);

    participant.dispatch(GameCommand::SelectQuest(0)).await.unwrap();
    let ana = participant
        .spawn_player(loc("FriendlyBack1"), PlayerId::new("ana"), "squire")
        .await
        .unwrap();
    participant.spawn_wave(0, 1).await.unwrap();
    participant
        .dispatch(GameCommand::AllReadyForCombatStart)
        .await
        .unwrap();

    println!("💀 Felling the local player's character...");
    participant
        .dispatch(finishing_blow("HostileFront1", "FriendlyBack1", Issuer::Ai))
        .await
        .unwrap();

    let player = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            if let Ok(Event::Turn(TurnEvent::TurnForfeited { player })) = turns.recv().await {
                return player;
            }
        }
    })
    .await
    .expect("turn forfeited");
    assert_eq!(player.as_str(), "ana");

    let marked = drain(&mut combat)
        .into_iter()
        .any(|e| matches!(e, Event::Combat(CombatEvent::TurnEndMarked { id }) if id == ana));
    assert!(marked);

    participant.shutdown().await.unwrap();
    println!("✅ Forfeit test passed");
}

#[tokio::test(start_paused = true)]
async fn director_recovers_from_a_lagging_event_stream() {
    let config = RuntimeConfig {
        event_buffer_size: 1,
        ..RuntimeConfig::default()
    };
    let participant = Participant::builder()
        .config(config)
        .oracles(oracles())
        .build()
        .await
        .unwrap();

    participant.dispatch(GameCommand::SelectQuest(0)).await.unwrap();
    participant.spawn_wave(0, 1).await.unwrap();
    participant
        .dispatch(GameCommand::AllReadyForCombatStart)
        .await
        .unwrap();

    let state = tokio::time::timeout(Duration::from_secs(3600), async {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let state = participant.handle().query_state().await.unwrap();
            if state.turn.game_ended {
                return state;
            }
        }
    })
    .await
    .expect("encounter finishes despite lag");

    assert!(state.turn.turn > 0);
    assert!(state.turn.outcome.is_some());

    participant.shutdown().await.unwrap();
}
