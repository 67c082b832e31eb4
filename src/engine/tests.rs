use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::codec::deserialize_deck;
use crate::engine::bot::{
    apply_hint, default_state_ranking, play_best_move, BotOptions, MAX_LOOK_AHEAD_MOVES,
};
use crate::engine::generator::{
    run_attempt_with_game, GeneratorOptions, TaskScheduler, WinnableGamesGenerator,
};
use crate::engine::hints::{
    move_hints, reachable_waste_cards, Confidence, HintMode, MoveHint,
};
use crate::game::{
    Card, Desk, Game, GameError, GameRules, GameTime, Move, MoveRecord, Pile, Suit, Tableau,
    RANK_ACE, RANK_KING,
};

fn card(suit: Suit, rank: u8, deal_order: u16, face_up: bool) -> Card {
    Card {
        suit,
        rank,
        face_up,
        deal_order,
    }
}

fn empty_desk(tableau_piles: usize) -> Desk {
    Desk {
        stock: Pile::new(),
        waste: Pile::new(),
        foundations: std::array::from_fn(|_| Pile::new()),
        tableau: Tableau::new(vec![Pile::new(); tableau_piles]),
    }
}

fn game_from(state: Desk, rules: GameRules) -> Game {
    Game {
        state,
        rules,
        history: Vec::new(),
        future: VecDeque::new(),
        time: GameTime {
            started_at_ms: 0,
            started_tick: 0,
        },
    }
}

fn foundation_run(suit: Suit, up_to: u8, order_base: u16) -> Pile {
    Pile::from_cards(
        (RANK_ACE..=up_to)
            .map(|rank| card(suit, rank, order_base + u16::from(rank) - 1, true))
            .collect(),
    )
}

fn find_hint(hints: &[MoveHint], mv: Move) -> Option<&MoveHint> {
    hints.iter().find(|hint| hint.mv == mv)
}

#[test]
fn confidence_tiers_are_totally_ordered() {
    for pair in Confidence::ALL.windows(2) {
        assert!(pair[0] < pair[1]);
    }
}

#[test]
fn hints_are_sorted_by_descending_confidence() {
    let game = Game::new_with_seed(GameRules::klondike(), 21).unwrap();
    let hints = move_hints(&game, HintMode::WithFullStock);
    for pair in hints.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
}

#[test]
fn every_hint_is_playable() {
    let game = Game::new_with_seed(GameRules::klondike(), 21).unwrap();
    for hint in move_hints(&game, HintMode::WithFullStock) {
        assert!(apply_hint(&game, &hint).is_ok(), "unplayable hint {:?}", hint.mv);
    }
}

#[test]
fn revealing_a_hidden_top_is_absolute() {
    let mut desk = empty_desk(7);
    desk.tableau.piles[3] = Pile::from_cards(vec![card(Suit::Clubs, 9, 0, false)]);
    let game = game_from(desk, GameRules::klondike());

    let hints = move_hints(&game, HintMode::CurrentState);
    let hint = find_hint(&hints, Move::RevealTableauCard { pile: 3 }).unwrap();
    assert_eq!(hint.confidence, Confidence::Absolute);
}

#[test]
fn aces_and_twos_go_to_the_foundation_with_absolute_confidence() {
    let mut desk = empty_desk(7);
    desk.tableau.piles[0] = Pile::from_cards(vec![card(Suit::Hearts, RANK_ACE, 0, true)]);
    desk.tableau.piles[1] = Pile::from_cards(vec![card(Suit::Spades, 4, 1, false)]);
    let game = game_from(desk, GameRules::klondike());

    let hints = move_hints(&game, HintMode::CurrentState);
    let hint = find_hint(&hints, Move::TableauToFoundation { pile: 0 }).unwrap();
    assert_eq!(hint.confidence, Confidence::Absolute);
}

#[test]
fn safe_foundation_moves_depend_on_the_opposite_color() {
    let mut desk = empty_desk(7);
    desk.foundations[Suit::Hearts.foundation_index()] = foundation_run(Suit::Hearts, 4, 0);
    desk.foundations[Suit::Clubs.foundation_index()] = foundation_run(Suit::Clubs, 4, 13);
    desk.foundations[Suit::Spades.foundation_index()] = foundation_run(Suit::Spades, 4, 26);
    desk.tableau.piles[0] = Pile::from_cards(vec![card(Suit::Hearts, 5, 40, true)]);
    // A hidden card keeps the game from being victory-locked.
    desk.tableau.piles[1] = Pile::from_cards(vec![card(Suit::Diamonds, 9, 41, false)]);

    let game = game_from(desk.clone(), GameRules::klondike());
    let hints = move_hints(&game, HintMode::CurrentState);
    let hint = find_hint(&hints, Move::TableauToFoundation { pile: 0 }).unwrap();
    assert_eq!(hint.confidence, Confidence::Absolute);

    // Drop spades back to three: the heart five might still be needed.
    desk.foundations[Suit::Spades.foundation_index()] = foundation_run(Suit::Spades, 3, 26);
    let game = game_from(desk, GameRules::klondike());
    let hints = move_hints(&game, HintMode::CurrentState);
    let hint = find_hint(&hints, Move::TableauToFoundation { pile: 0 }).unwrap();
    assert_eq!(hint.confidence, Confidence::VeryHigh);
}

#[test]
fn waste_to_tableau_is_medium() {
    let mut desk = empty_desk(7);
    desk.waste = Pile::from_cards(vec![card(Suit::Diamonds, 6, 0, true)]);
    desk.tableau.piles[0] = Pile::from_cards(vec![card(Suit::Spades, 7, 1, true)]);
    let game = game_from(desk, GameRules::klondike());

    let hints = move_hints(&game, HintMode::CurrentState);
    let hint = find_hint(&hints, Move::WasteToTableau { pile: 0 }).unwrap();
    assert_eq!(hint.confidence, Confidence::Medium);
}

#[test]
fn tableau_run_confidence_depends_on_what_it_uncovers() {
    let mut desk = empty_desk(7);
    desk.tableau.piles[0] = Pile::from_cards(vec![
        card(Suit::Clubs, 2, 0, false),
        card(Suit::Spades, 9, 1, true),
    ]);
    desk.tableau.piles[1] = Pile::from_cards(vec![card(Suit::Diamonds, 10, 2, true)]);
    desk.tableau.piles[2] = Pile::from_cards(vec![
        card(Suit::Hearts, 3, 3, false),
        card(Suit::Spades, RANK_KING, 4, true),
    ]);
    desk.tableau.piles[3] = Pile::from_cards(vec![card(Suit::Hearts, 10, 5, true)]);
    desk.tableau.piles[5] = Pile::from_cards(vec![card(Suit::Spades, 11, 6, true)]);
    let game = game_from(desk, GameRules::klondike());

    let hints = move_hints(&game, HintMode::CurrentState);
    let uncovering = find_hint(
        &hints,
        Move::TableauToTableau {
            src: 0,
            card_index: 1,
            dst: 1,
        },
    )
    .unwrap();
    assert_eq!(uncovering.confidence, Confidence::VeryHigh);

    let king_to_empty = find_hint(
        &hints,
        Move::TableauToTableau {
            src: 2,
            card_index: 1,
            dst: 4,
        },
    )
    .unwrap();
    assert_eq!(king_to_empty.confidence, Confidence::High);

    let plain = find_hint(
        &hints,
        Move::TableauToTableau {
            src: 1,
            card_index: 0,
            dst: 5,
        },
    )
    .unwrap();
    assert_eq!(plain.confidence, Confidence::Low);
}

#[test]
fn whole_pile_shuffles_onto_empty_piles_are_not_suggested() {
    let mut desk = empty_desk(7);
    desk.tableau.piles[0] = Pile::from_cards(vec![card(Suit::Spades, RANK_KING, 0, true)]);
    desk.tableau.piles[1] = Pile::from_cards(vec![card(Suit::Clubs, 4, 1, false)]);
    let game = game_from(desk, GameRules::klondike());

    let hints = move_hints(&game, HintMode::CurrentState);
    assert!(hints
        .iter()
        .all(|hint| !matches!(hint.mv, Move::TableauToTableau { src: 0, .. })));
}

#[test]
fn foundation_returns_are_suppressed_once_victory_is_locked() {
    let mut desk = empty_desk(7);
    desk.foundations[Suit::Hearts.foundation_index()] = foundation_run(Suit::Hearts, 2, 0);
    desk.tableau.piles[0] = Pile::from_cards(vec![card(Suit::Spades, 3, 10, true)]);

    let locked = game_from(desk.clone(), GameRules::klondike());
    let hints = move_hints(&locked, HintMode::CurrentState);
    assert!(hints
        .iter()
        .all(|hint| !matches!(hint.mv, Move::FoundationToTableau { .. })));

    desk.tableau.piles[1] = Pile::from_cards(vec![card(Suit::Clubs, 8, 11, false)]);
    let open = game_from(desk, GameRules::klondike());
    let hints = move_hints(&open, HintMode::CurrentState);
    let hint = find_hint(
        &hints,
        Move::FoundationToTableau {
            suit: Suit::Hearts,
            pile: 0,
        },
    )
    .unwrap();
    assert_eq!(hint.confidence, Confidence::Low);
}

#[test]
fn full_stock_mode_reaches_every_waste_card() {
    let draw_one = Game::new_with_seed(GameRules::klondike(), 33).unwrap();
    assert_eq!(reachable_waste_cards(&draw_one).len(), 24);

    let rules = GameRules {
        drawn_cards: 3,
        ..GameRules::klondike()
    };
    let draw_three = Game::new_with_seed(rules, 33).unwrap();
    assert_eq!(reachable_waste_cards(&draw_three).len(), 8);
}

#[test]
fn bot_auto_accepts_the_top_tier() {
    let mut desk = empty_desk(7);
    desk.tableau.piles[2] = Pile::from_cards(vec![card(Suit::Clubs, 9, 0, false)]);
    let game = game_from(desk, GameRules::klondike());

    let next = play_best_move(&game, &BotOptions::default()).unwrap();
    assert!(next.state().tableau().pile(2).unwrap().top().unwrap().face_up);
    assert_eq!(next.move_count(), 1);
}

#[test]
fn bot_search_picks_the_highest_ranked_outcome() {
    let mut desk = empty_desk(7);
    desk.waste = Pile::from_cards(vec![card(Suit::Diamonds, 6, 0, true)]);
    desk.tableau.piles[0] = Pile::from_cards(vec![card(Suit::Spades, 7, 1, true)]);
    desk.tableau.piles[1] = Pile::from_cards(vec![card(Suit::Clubs, RANK_ACE, 2, true)]);
    let game = game_from(desk, GameRules::klondike());

    let options = BotOptions {
        min_auto_accept_confidence: None,
        max_considered_confidence_levels: 4,
        look_ahead_moves: 0,
        ranking: default_state_ranking,
    };
    // Keeping the six in play scores better than burying the ace's slot.
    let next = play_best_move(&game, &options).unwrap();
    assert!(next.state().waste().is_empty());
    assert_eq!(next.state().tableau().pile(0).unwrap().top().unwrap().rank, 6);
}

#[test]
fn bot_play_preserves_desk_invariants() {
    let mut game = Game::new_with_seed(GameRules::klondike(), 27).unwrap();
    let options = BotOptions {
        look_ahead_moves: 0,
        ..BotOptions::default()
    };
    for _ in 0..30 {
        let next = play_best_move(&game, &options).unwrap();
        if next == game {
            break;
        }
        game = next;
        assert_eq!(game.state().total_cards(), 52);
        for (index, pile) in game.state().foundations().iter().enumerate() {
            for (depth, card) in pile.iter().enumerate() {
                assert_eq!(card.suit.foundation_index(), index);
                assert_eq!(usize::from(card.rank), depth + 1);
            }
        }
    }
}

#[test]
fn bot_leaves_a_stuck_game_unchanged() {
    let mut desk = empty_desk(7);
    desk.tableau.piles[0] = Pile::from_cards(vec![card(Suit::Spades, RANK_KING, 0, true)]);
    let game = game_from(desk, GameRules::klondike());

    let next = play_best_move(&game, &BotOptions::default()).unwrap();
    assert_eq!(next, game);
}

#[test]
fn bot_options_are_capped() {
    let too_deep = BotOptions {
        look_ahead_moves: MAX_LOOK_AHEAD_MOVES + 1,
        ..BotOptions::default()
    };
    assert!(matches!(
        too_deep.validate(),
        Err(GameError::InvalidBotOptions(_))
    ));

    let too_wide = BotOptions {
        max_considered_confidence_levels: 5,
        ..BotOptions::default()
    };
    assert!(matches!(
        too_wide.validate(),
        Err(GameError::InvalidBotOptions(_))
    ));
}

#[test]
fn waste_hints_cycle_the_stock_as_needed() {
    let six = card(Suit::Hearts, 6, 1, false);
    let mut desk = empty_desk(7);
    desk.stock = Pile::from_cards(vec![six, card(Suit::Clubs, 2, 0, false)]);
    desk.tableau.piles[0] = Pile::from_cards(vec![card(Suit::Spades, 7, 2, true)]);
    let game = game_from(desk, GameRules::klondike());

    let hint = MoveHint {
        mv: Move::WasteToTableau { pile: 0 },
        card: six,
        confidence: Confidence::Medium,
    };
    let next = apply_hint(&game, &hint).unwrap();
    assert_eq!(next.state().tableau().pile(0).unwrap().top().unwrap().rank, 6);
    assert_eq!(next.state().waste().len(), 1);
}

#[test]
fn unreachable_waste_hints_fail_instead_of_looping() {
    let mut desk = empty_desk(7);
    desk.stock = Pile::from_cards(vec![card(Suit::Clubs, 2, 0, false)]);
    desk.tableau.piles[0] = Pile::from_cards(vec![card(Suit::Spades, 7, 1, true)]);
    let game = game_from(desk, GameRules::klondike());

    let hint = MoveHint {
        mv: Move::WasteToTableau { pile: 0 },
        card: card(Suit::Diamonds, 6, 9, true),
        confidence: Confidence::Medium,
    };
    assert!(matches!(
        apply_hint(&game, &hint),
        Err(GameError::IllegalMove(_))
    ));
}

#[derive(Default)]
struct ManualScheduler {
    tasks: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl ManualScheduler {
    fn pump(&self) -> bool {
        let task = self.tasks.lock().unwrap().pop();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    fn pending(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }
}

impl TaskScheduler for ManualScheduler {
    fn schedule(&self, task: Box<dyn FnOnce() + Send>) {
        self.tasks.lock().unwrap().push(task);
    }
}

fn quick_options() -> GeneratorOptions {
    GeneratorOptions {
        bot: BotOptions {
            look_ahead_moves: 0,
            ..BotOptions::default()
        },
        max_moves_per_attempt: 2,
        ..GeneratorOptions::default()
    }
}

/// A game one move from victory whose first history record holds a genuine
/// deal, so the winning deck can be recovered from it.
fn nearly_won_game() -> Game {
    let dealt = Game::new_with_seed(GameRules::klondike(), 9).unwrap();
    let mut state = empty_desk(7);
    state.foundations[Suit::Clubs.foundation_index()] = foundation_run(Suit::Clubs, RANK_KING, 0);
    state.foundations[Suit::Diamonds.foundation_index()] =
        foundation_run(Suit::Diamonds, RANK_KING, 13);
    state.foundations[Suit::Hearts.foundation_index()] =
        foundation_run(Suit::Hearts, RANK_KING, 26);
    state.foundations[Suit::Spades.foundation_index()] = foundation_run(Suit::Spades, 12, 39);
    state.tableau.piles[0] = Pile::from_cards(vec![card(Suit::Spades, RANK_KING, 51, true)]);

    Game {
        state,
        rules: dealt.rules(),
        history: vec![MoveRecord {
            prior: dealt.state().clone(),
            mv: Move::DrawCards { count: 1 },
            tick: 0,
        }],
        future: VecDeque::new(),
        time: dealt.time(),
    }
}

#[test]
fn an_attempt_that_wins_yields_its_deck() {
    let deck = run_attempt_with_game(nearly_won_game(), &GeneratorOptions::default(), None)
        .expect("the attempt should win");
    assert!(deck.starts_with('1'));
    assert!(deserialize_deck(&deck).is_ok());
}

#[test]
fn a_cancelled_attempt_stops_early() {
    let cancel = AtomicBool::new(true);
    let found = run_attempt_with_game(nearly_won_game(), &GeneratorOptions::default(), Some(&cancel));
    assert!(found.is_none());
}

#[test]
fn a_stuck_attempt_reports_no_deck() {
    let mut desk = empty_desk(7);
    desk.tableau.piles[0] = Pile::from_cards(vec![card(Suit::Spades, RANK_KING, 0, true)]);
    let game = game_from(desk, GameRules::klondike());
    assert!(run_attempt_with_game(game, &quick_options(), None).is_none());
}

#[test]
fn generator_rejects_a_bad_configuration() {
    let scheduler = Arc::new(ManualScheduler::default());

    let no_moves = GeneratorOptions {
        max_moves_per_attempt: 0,
        ..GeneratorOptions::default()
    };
    assert!(matches!(
        WinnableGamesGenerator::new(no_moves, scheduler.clone()),
        Err(GameError::InvalidRules(_))
    ));

    let bad_bot = GeneratorOptions {
        bot: BotOptions {
            look_ahead_moves: MAX_LOOK_AHEAD_MOVES + 1,
            ..BotOptions::default()
        },
        ..GeneratorOptions::default()
    };
    assert!(matches!(
        WinnableGamesGenerator::new(bad_bot, scheduler),
        Err(GameError::InvalidBotOptions(_))
    ));
}

#[test]
fn run_schedules_one_attempt_per_slice_until_stopped() {
    let scheduler = Arc::new(ManualScheduler::default());
    let generator =
        WinnableGamesGenerator::new(quick_options(), scheduler.clone()).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    generator.run(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    assert!(generator.is_running());
    assert_eq!(scheduler.pending(), 1);

    // A second start while running changes nothing.
    generator.run(|_| {});
    assert_eq!(scheduler.pending(), 1);

    assert!(scheduler.pump());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(scheduler.pending(), 1);

    generator.stop();
    assert!(!generator.is_running());
    assert!(scheduler.pump());
    // The stop was observed before the attempt ran.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!scheduler.pump());
}

#[test]
fn one_shot_generation_reschedules_until_cancelled() {
    let scheduler = Arc::new(ManualScheduler::default());
    let generator =
        WinnableGamesGenerator::new(quick_options(), scheduler.clone()).unwrap();

    let handle = generator.generate_one();
    assert_eq!(scheduler.pending(), 1);

    // A two-move attempt cannot win, so the slice reschedules itself.
    assert!(scheduler.pump());
    assert_eq!(scheduler.pending(), 1);
    assert!(handle.try_take().is_none());

    handle.cancel();
    assert!(scheduler.pump());
    assert_eq!(scheduler.pending(), 0);
    assert!(handle.wait().is_none());
}
