//! Event window pipeline integration tests.
//!
//! These tests drive full windows through the driver and verify the phase
//! contract: fixed phases in order, stable execution ordering, repeated
//! condition checks, and then-ability chaining.

use std::cell::RefCell;
use std::rc::Rc;

use proptest::prelude::*;

use ccg_events::{
    AbilityPhase, Event, EventId, EventName, EventPayload, Game, PipelineStatus, PlayerId,
    TriggeredAbility, WindowId, WindowPhase,
};

const ON_CARD_PLAYED: EventName = EventName::new("onCardPlayed");
const ON_FATE_GAINED: EventName = EventName::new("onFateGained");

/// The ten fixed phases, in pipeline order.
const FIXED_PHASES: [WindowPhase; 10] = [
    WindowPhase::SetCurrentWindow,
    WindowPhase::CheckEventCondition,
    WindowPhase::OpenInterruptWindow,
    WindowPhase::PreResolutionEffects,
    WindowPhase::ExecuteHandlers,
    WindowPhase::CheckGameState,
    WindowPhase::CheckThenAbilities,
    WindowPhase::ConstantReactions,
    WindowPhase::OpenReactionWindow,
    WindowPhase::ResetCurrentWindow,
];

/// Drain the driver, collecting every (window, phase) step.
fn drain(game: &mut Game) -> Vec<(WindowId, WindowPhase)> {
    let mut steps = Vec::new();
    while let PipelineStatus::Advanced { window, phase } = game.advance() {
        steps.push((window, phase));
    }
    steps
}

#[test]
fn test_fixed_phases_run_in_order() {
    let mut game = Game::new(2, 42);
    let id = game.open_event_window([Event::new(ON_CARD_PLAYED)]);

    let steps = drain(&mut game);

    let fixed: Vec<WindowPhase> = steps
        .iter()
        .filter(|(w, p)| *w == id && p.is_fixed())
        .map(|(_, p)| *p)
        .collect();
    assert_eq!(fixed, FIXED_PHASES);
    assert_eq!(game.window_depth(), 0);
}

#[test]
fn test_empty_batch_still_runs_every_phase() {
    let mut game = Game::new(2, 42);
    game.open_event_window([]);

    let steps = drain(&mut game);

    // No events means no injected trigger-window steps, only the ten phases.
    let phases: Vec<WindowPhase> = steps.iter().map(|(_, p)| *p).collect();
    assert_eq!(phases, FIXED_PHASES);
}

#[test]
fn test_handler_executes_and_records_history() {
    let mut game = Game::new(2, 42);
    let p0 = PlayerId::new(0);

    let emitted = Rc::new(RefCell::new(0u32));
    let emitted_in = Rc::clone(&emitted);
    game.on_event(ON_FATE_GAINED, move |_, _| {
        *emitted_in.borrow_mut() += 1;
    });

    game.open_event_window([Event::new(ON_FATE_GAINED)
        .with_player(p0)
        .with_handler(|state, payload| {
            let player = payload.player.expect("player set");
            state.modify_player_state(player, "fate", 3);
        })]);
    game.run_until_idle();

    assert_eq!(game.state.get_player_state(p0, "fate", 0), 3);
    assert_eq!(*emitted.borrow(), 1);
    assert_eq!(game.state.history().len(), 1);
    assert_eq!(game.state.history()[0].name, "onFateGained");
    assert_eq!(game.state.history()[0].player, Some(p0));
}

#[test]
fn test_cancelled_event_skips_handler_and_listener() {
    let mut game = Game::new(2, 42);

    let emitted = Rc::new(RefCell::new(0u32));
    let emitted_in = Rc::clone(&emitted);
    game.on_event(ON_CARD_PLAYED, move |_, _| {
        *emitted_in.borrow_mut() += 1;
    });

    game.open_event_window([Event::new(ON_CARD_PLAYED)
        .with_condition(|_, _| false)
        .with_handler(|state, _| state.set_global("played", 1))]);
    game.run_until_idle();

    assert_eq!(game.state.get_global("played", 0), 0);
    assert_eq!(*emitted.borrow(), 0);
    assert!(game.state.history().is_empty());
}

#[test]
fn test_execution_sorts_by_order_key() {
    let mut game = Game::new(2, 42);
    let log: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));

    let events: Vec<Event> = [3, 1, 2]
        .into_iter()
        .map(|order| {
            let log = Rc::clone(&log);
            Event::new(ON_CARD_PLAYED)
                .with_order(order)
                .with_handler(move |_, _| log.borrow_mut().push(order))
        })
        .collect();

    game.open_event_window(events);
    game.run_until_idle();

    assert_eq!(*log.borrow(), vec![1, 2, 3]);
}

#[test]
fn test_equal_order_keys_keep_insertion_order() {
    let mut game = Game::new(2, 42);
    let log: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new(Vec::new()));

    let events: Vec<Event> = (0..4)
        .map(|index| {
            let log = Rc::clone(&log);
            Event::new(ON_CARD_PLAYED).with_handler(move |_, _| log.borrow_mut().push(index))
        })
        .collect();

    game.open_event_window(events);
    game.run_until_idle();

    assert_eq!(*log.borrow(), vec![0, 1, 2, 3]);
}

#[test]
fn test_earlier_event_invalidates_later_one() {
    let mut game = Game::new(2, 42);

    // The first handler flips the flag the second event's condition reads.
    game.open_event_window([
        Event::new(ON_CARD_PLAYED)
            .with_order(1)
            .with_handler(|state, _| state.set_global("blocked", 1)),
        Event::new(ON_FATE_GAINED)
            .with_order(2)
            .with_condition(|state, _| state.get_global("blocked", 0) == 0)
            .with_handler(|state, _| state.set_global("fate_ran", 1)),
    ]);
    game.run_until_idle();

    assert_eq!(game.state.get_global("blocked", 0), 1);
    assert_eq!(game.state.get_global("fate_ran", 0), 0);
    assert_eq!(game.state.history().len(), 1);
}

#[test]
fn test_pre_resolution_runs_before_handler() {
    let mut game = Game::new(2, 42);
    let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
    let pre_log = Rc::clone(&log);
    let handler_log = Rc::clone(&log);

    game.open_event_window([Event::new(ON_CARD_PLAYED)
        .with_pre_resolution(move |_, _| pre_log.borrow_mut().push("pre"))
        .with_handler(move |_, _| handler_log.borrow_mut().push("handler"))]);
    game.run_until_idle();

    assert_eq!(*log.borrow(), vec!["pre", "handler"]);
}

#[test]
fn test_then_ability_resolves_exactly_once() {
    let mut game = Game::new(2, 42);
    let ability = game.register_ability(TriggeredAbility::chained("Draw After Play", |scope| {
        scope.state.modify_global("then_ran", 1)
    }));

    let window = game.open_event_window([
        Event::new(ON_CARD_PLAYED).with_handler(|state, _| state.set_global("played", 1))
    ]);
    game.add_then_ability(window, [EventId::new(0)], ability, None);
    game.run_until_idle();

    // Phase 7 resolves the chain; the reaction window must not run it again.
    assert_eq!(game.state.get_global("then_ran", 0), 1);
}

#[test]
fn test_then_ability_dropped_when_trigger_cancelled() {
    let mut game = Game::new(2, 42);
    let then = game.register_ability(TriggeredAbility::chained("Draw After Play", |scope| {
        scope.state.modify_global("then_ran", 1)
    }));
    game.register_ability(TriggeredAbility::new(
        "Counter",
        AbilityPhase::Interrupt,
        ON_CARD_PLAYED,
        |mut scope| {
            let trigger = scope.context().pre_event().expect("trigger set");
            scope.cancel_event(trigger);
        },
    ));

    let window = game.open_event_window([
        Event::new(ON_CARD_PLAYED).with_handler(|state, _| state.set_global("played", 1))
    ]);
    game.add_then_ability(window, [EventId::new(0)], then, None);
    game.run_until_idle();

    assert_eq!(game.state.get_global("played", 0), 0);
    assert_eq!(game.state.get_global("then_ran", 0), 0);
}

#[test]
fn test_then_ability_with_multiple_triggers_resolves_once() {
    let mut game = Game::new(2, 42);
    let then = game.register_ability(TriggeredAbility::chained("Reward", |scope| {
        scope.state.modify_global("then_ran", 1)
    }));

    let window = game.open_event_window([
        Event::new(ON_CARD_PLAYED).with_handler(|_, _| {}),
        Event::new(ON_FATE_GAINED).with_handler(|_, _| {}),
    ]);
    game.add_then_ability(window, [EventId::new(0), EventId::new(1)], then, None);
    game.run_until_idle();

    assert_eq!(game.state.get_global("then_ran", 0), 1);
}

#[test]
fn test_then_ability_needs_entire_trigger_set() {
    let mut game = Game::new(2, 42);
    let then = game.register_ability(TriggeredAbility::chained("Reward", |scope| {
        scope.state.modify_global("then_ran", 1)
    }));
    // Cancels only the second trigger event.
    game.register_ability(TriggeredAbility::new(
        "Counter Fate",
        AbilityPhase::Interrupt,
        ON_FATE_GAINED,
        |mut scope| {
            let trigger = scope.context().pre_event().expect("trigger set");
            scope.cancel_event(trigger);
        },
    ));

    let window = game.open_event_window([
        Event::new(ON_CARD_PLAYED).with_handler(|state, _| state.modify_global("played", 1)),
        Event::new(ON_FATE_GAINED).with_handler(|state, _| state.modify_global("fate", 1)),
    ]);
    game.add_then_ability(window, [EventId::new(0), EventId::new(1)], then, None);
    game.run_until_idle();

    // The surviving trigger still executes, but the chain is all-or-nothing.
    assert_eq!(game.state.get_global("played", 0), 1);
    assert_eq!(game.state.get_global("fate", 0), 0);
    assert_eq!(game.state.get_global("then_ran", 0), 0);
}

#[test]
fn test_state_checker_sees_had_handler() {
    let mut game = Game::new(2, 42);
    let flags: Rc<RefCell<Vec<bool>>> = Rc::new(RefCell::new(Vec::new()));
    let flags_in = Rc::clone(&flags);
    game.set_state_checker(move |_, had_handler, _| flags_in.borrow_mut().push(had_handler));

    game.open_event_window([Event::new(ON_CARD_PLAYED).with_handler(|_, _| {})]);
    game.run_until_idle();
    game.open_event_window([Event::new(ON_CARD_PLAYED)]);
    game.run_until_idle();

    assert_eq!(*flags.borrow(), vec![true, false]);
}

#[test]
fn test_state_checker_runs_even_when_batch_cancelled() {
    let mut game = Game::new(2, 42);
    let runs = Rc::new(RefCell::new(0u32));
    let runs_in = Rc::clone(&runs);
    game.set_state_checker(move |_, _, _| *runs_in.borrow_mut() += 1);

    game.open_event_window([Event::new(ON_CARD_PLAYED).with_condition(|_, _| false)]);
    game.run_until_idle();

    assert_eq!(*runs.borrow(), 1);
}

#[test]
fn test_event_can_join_batch_before_advancing() {
    let mut game = Game::new(2, 42);
    game.open_event_window([Event::new(ON_CARD_PLAYED)
        .with_handler(|state, _| state.modify_global("executed", 1))]);

    // Actions may append to the pending batch until the driver runs it.
    game.current_window_mut()
        .expect("window open")
        .add_event(Event::new(ON_FATE_GAINED).with_handler(|state, _| {
            state.modify_global("executed", 1);
        }));
    game.run_until_idle();

    assert_eq!(game.state.get_global("executed", 0), 2);
}

#[test]
fn test_history_tracks_turn_numbers() {
    let mut game = Game::new(2, 42);

    game.open_event_window([Event::new(ON_CARD_PLAYED).with_handler(|_, _| {})]);
    game.run_until_idle();

    game.state.advance_turn();
    game.open_event_window([Event::new(ON_CARD_PLAYED).with_handler(|_, _| {})]);
    game.run_until_idle();

    assert_eq!(game.state.history()[0].turn, 1);
    assert_eq!(game.state.history()[1].turn, 2);
}

#[test]
fn test_payload_serde_round_trip() {
    let payload = EventPayload::new()
        .with_player(PlayerId::new(1))
        .with_value(5)
        .with_tag("combat");

    let json = serde_json::to_string(&payload).unwrap();
    let back: EventPayload = serde_json::from_str(&json).unwrap();
    assert_eq!(back, payload);
}

proptest! {
    /// Any mix of order keys executes in nondecreasing key order, with equal
    /// keys kept in insertion order.
    #[test]
    fn prop_execution_respects_order_keys(orders in prop::collection::vec(-3i32..3, 1..8)) {
        let mut game = Game::new(2, 42);
        let log: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));

        let events: Vec<Event> = orders
            .iter()
            .enumerate()
            .map(|(index, &order)| {
                let log = Rc::clone(&log);
                Event::new(ON_CARD_PLAYED)
                    .with_order(order)
                    .with_handler(move |_, _| log.borrow_mut().push(index))
            })
            .collect();

        game.open_event_window(events);
        game.run_until_idle();

        let mut expected: Vec<usize> = (0..orders.len()).collect();
        expected.sort_by_key(|&i| orders[i]);
        prop_assert_eq!(&*log.borrow(), &expected);
    }
}
