//! Integration tests for full game flows.
//!
//! These tests drive complete games through the synchronous state core,
//! from lobby setup through question resolution and game finish.

use chrono::{DateTime, Duration, Utc};
use fermi_poker::{
    ChangeKind, EntityKind, GameError, GameSettings, GameState, IdSeq,
    entities::{
        BetAction, DisplayName, GameStatus, Player, PlayerId, PlayerStatus, QuestionId,
        QuestionPhase, SessionId, Standing,
    },
};

fn new_game(meta_game_on: bool) -> GameState {
    GameState::create(meta_game_on, GameSettings::default(), IdSeq::new(), Utc::now())
}

/// Seats a player and returns their id.
fn seat(state: &mut GameState, token: &str, name: &str, now: DateTime<Utc>) -> PlayerId {
    state
        .join(SessionId::new(token), DisplayName::new(name), now)
        .expect("join failed")
        .id
}

/// Looks up a player by id.
fn player(state: &GameState, player_id: PlayerId) -> &Player {
    state
        .players
        .iter()
        .find(|p| p.id == player_id)
        .expect("unknown player id")
}

fn chips(state: &GameState, player_id: PlayerId) -> u32 {
    player(state, player_id).chips
}

/// Every listed player checks the given round.
fn all_check(
    state: &mut GameState,
    question_id: QuestionId,
    round: u8,
    players: &[PlayerId],
    now: DateTime<Utc>,
) {
    for &p in players {
        state
            .submit_bet(p, question_id, round, BetAction::Check, 0, now)
            .expect("check failed");
    }
}

/// Checks through all three betting rounds, which resolves the question.
fn check_through(
    state: &mut GameState,
    question_id: QuestionId,
    players: &[PlayerId],
    now: DateTime<Utc>,
) {
    for round in 1..=3 {
        all_check(state, question_id, round, players, now);
    }
}

#[test]
fn test_second_seat_unlocks_start() {
    let now = Utc::now();
    let mut state = new_game(false);
    state
        .add_question("How many ping pong balls fit in a school bus?", 500, 10, 1, vec![])
        .unwrap();
    let a = seat(&mut state, "tok-a", "ada", now);
    assert_eq!(state.start(a, now), Err(GameError::NotEnoughPlayers(2)));

    seat(&mut state, "tok-b", "bob", now);
    state.start(a, now).unwrap();
    assert_eq!(state.game.status, GameStatus::Active);
    // Antes hit the pot the moment the first question opens.
    assert_eq!(state.questions[0].pot_size(), 20);
    assert_eq!(
        state.questions[0].guess_deadline,
        Some(now + Duration::seconds(60))
    );
}

#[test]
fn test_host_seat_passes_when_host_leaves() {
    let now = Utc::now();
    let mut state = new_game(false);
    state.add_question("q", 500, 10, 1, vec![]).unwrap();
    let a = seat(&mut state, "tok-a", "ada", now);
    let b = seat(&mut state, "tok-b", "bob", now + Duration::seconds(1));
    let c = seat(&mut state, "tok-c", "cat", now + Duration::seconds(2));

    state.leave(a, now + Duration::seconds(3)).unwrap();
    assert_eq!(state.host_id(), Some(b));
    assert_eq!(
        state.start(c, now + Duration::seconds(4)),
        Err(GameError::NotHost)
    );
    state.start(b, now + Duration::seconds(4)).unwrap();
    // The departed player has no seat in the question.
    assert_eq!(state.questions[0].standing_of(a), None);
    assert_eq!(state.questions[0].pot_size(), 20);
}

#[test]
fn test_deadline_folds_players_without_guesses() {
    let now = Utc::now();
    let mut state = new_game(false);
    state.add_question("q", 500, 10, 1, vec![]).unwrap();
    let a = seat(&mut state, "tok-a", "ada", now);
    let b = seat(&mut state, "tok-b", "bob", now);
    let c = seat(&mut state, "tok-c", "cat", now);
    state.start(a, now).unwrap();
    let qid = state.questions[0].question.id;

    // Only ada answers, and never even locks the guess in.
    state.submit_guess(a, qid, 400, 600, false, now).unwrap();

    let late = now + Duration::seconds(61);
    assert_eq!(
        state.submit_guess(b, qid, 1, 2, false, late),
        Err(GameError::WrongPhase {
            phase: QuestionPhase::BettingRound1
        })
    );
    assert_eq!(
        state.questions[0].standing_of(b),
        Some(Standing::FoldedForQuestion)
    );
    assert_eq!(
        state.questions[0].standing_of(c),
        Some(Standing::FoldedForQuestion)
    );
    assert_eq!(
        state.questions[0].standing_of(a),
        Some(Standing::ActiveForQuestion)
    );

    // The unlocked guess still plays, and wins unopposed.
    check_through(&mut state, qid, &[a], late);
    let res = state.questions[0].resolution.clone().unwrap();
    assert_eq!(res.winners, vec![a]);
    assert_eq!(chips(&state, a), 120);
    assert_eq!(chips(&state, b), 90);
    assert_eq!(chips(&state, c), 90);
}

#[test]
fn test_leaving_player_is_folded_and_not_waited_on() {
    let now = Utc::now();
    let mut state = new_game(false);
    state.add_question("q", 500, 10, 1, vec![]).unwrap();
    let a = seat(&mut state, "tok-a", "ada", now);
    let b = seat(&mut state, "tok-b", "bob", now);
    state.start(a, now).unwrap();
    let qid = state.questions[0].question.id;

    state.submit_guess(a, qid, 400, 600, true, now).unwrap();
    state.leave(b, now).unwrap();
    assert_eq!(player(&state, b).status, PlayerStatus::LeftGame);
    assert_eq!(
        state.questions[0].standing_of(b),
        Some(Standing::FoldedForQuestion)
    );
    // With the leaver folded, ada's locked guess is the last one outstanding.
    assert_eq!(state.questions[0].phase(), QuestionPhase::BettingRound1);

    check_through(&mut state, qid, &[a], now);
    assert_eq!(chips(&state, a), 110);
    assert_eq!(chips(&state, b), 90);

    // Leaving twice is harmless.
    let again = state.leave(b, now).unwrap();
    assert_eq!(again.status, PlayerStatus::LeftGame);
}

#[test]
fn test_raises_settle_round_by_round() {
    let now = Utc::now();
    let mut state = new_game(false);
    state.add_question("q", 500, 10, 1, vec![]).unwrap();
    let a = seat(&mut state, "tok-a", "ada", now);
    let b = seat(&mut state, "tok-b", "bob", now);
    let c = seat(&mut state, "tok-c", "cat", now);
    state.start(a, now).unwrap();
    let qid = state.questions[0].question.id;

    state.submit_guess(a, qid, 400, 600, true, now).unwrap();
    state.submit_guess(b, qid, 600, 700, true, now).unwrap();
    state.submit_guess(c, qid, 1, 2, true, now).unwrap();
    assert_eq!(state.questions[0].phase(), QuestionPhase::BettingRound1);

    state
        .submit_bet(a, qid, 1, BetAction::Raise, 20, now)
        .unwrap();
    state
        .submit_bet(b, qid, 1, BetAction::Call, 0, now)
        .unwrap();
    assert_eq!(state.questions[0].highest_bet(1), 20);
    // A raise on the table cannot be checked past.
    assert_eq!(
        state.submit_bet(c, qid, 1, BetAction::Check, 0, now),
        Err(GameError::CheckWithOpenBet { highest: 20 })
    );
    state
        .submit_bet(c, qid, 1, BetAction::Fold, 0, now)
        .unwrap();
    assert_eq!(state.questions[0].phase(), QuestionPhase::BettingRound2);
    assert_eq!(
        state.submit_bet(c, qid, 2, BetAction::Check, 0, now),
        Err(GameError::FoldedOut)
    );

    // Each round opens fresh; bob leads this one.
    state
        .submit_bet(b, qid, 2, BetAction::Raise, 30, now)
        .unwrap();
    state
        .submit_bet(a, qid, 2, BetAction::Call, 0, now)
        .unwrap();
    assert_eq!(state.questions[0].phase(), QuestionPhase::BettingRound3);
    all_check(&mut state, qid, 3, &[a, b], now);

    let res = state.questions[0].resolution.clone().unwrap();
    assert_eq!(res.pot_size, 130);
    assert_eq!(res.winners, vec![a]);
    assert_eq!(chips(&state, a), 170);
    assert_eq!(chips(&state, b), 40);
    assert_eq!(chips(&state, c), 90);
}

#[test]
fn test_all_in_call_and_loser_bankruptcy() {
    let now = Utc::now();
    let mut state = new_game(false);
    state.add_question("q", 500, 10, 1, vec![]).unwrap();
    let a = seat(&mut state, "tok-a", "ada", now);
    let b = seat(&mut state, "tok-b", "bob", now);
    state.start(a, now).unwrap();
    let qid = state.questions[0].question.id;

    state.submit_guess(a, qid, 400, 600, true, now).unwrap();
    state.submit_guess(b, qid, 700, 800, true, now).unwrap();

    assert_eq!(
        state.submit_bet(a, qid, 1, BetAction::Raise, 95, now),
        Err(GameError::InsufficientChips {
            required: 95,
            available: 90
        })
    );
    state
        .submit_bet(a, qid, 1, BetAction::Raise, 90, now)
        .unwrap();
    state
        .submit_bet(b, qid, 1, BetAction::Call, 0, now)
        .unwrap();
    assert_eq!(chips(&state, a), 0);
    assert_eq!(chips(&state, b), 0);

    // Checking costs nothing, so the broke can still see it through.
    all_check(&mut state, qid, 2, &[a, b], now);
    all_check(&mut state, qid, 3, &[a, b], now);

    let res = state.questions[0].resolution.clone().unwrap();
    assert_eq!(res.pot_size, 200);
    assert_eq!(res.winners, vec![a]);
    assert_eq!(chips(&state, a), 200);
    assert_eq!(player(&state, b).status, PlayerStatus::Bankrupt);
}

#[test]
fn test_meta_game_off_blocks_predictions_and_rejoins() {
    let now = Utc::now();
    let mut state = new_game(false);
    state.add_question("q", 500, 10, 1, vec![]).unwrap();
    let a = seat(&mut state, "tok-a", "ada", now);
    let b = seat(&mut state, "tok-b", "bob", now);
    state.start(a, now).unwrap();
    let qid = state.questions[0].question.id;

    assert_eq!(
        state.submit_prediction(b, qid, a, now),
        Err(GameError::MetaGameOff)
    );

    // Bust bob the usual way: all in on a losing guess.
    state.submit_guess(a, qid, 400, 600, true, now).unwrap();
    state.submit_guess(b, qid, 700, 800, true, now).unwrap();
    state
        .submit_bet(a, qid, 1, BetAction::Raise, 90, now)
        .unwrap();
    state
        .submit_bet(b, qid, 1, BetAction::Call, 0, now)
        .unwrap();
    all_check(&mut state, qid, 2, &[a, b], now);
    all_check(&mut state, qid, 3, &[a, b], now);
    assert_eq!(player(&state, b).status, PlayerStatus::Bankrupt);

    assert_eq!(state.rejoin(b, now), Err(GameError::MetaGameOff));
}

#[test]
fn test_full_game_with_bankruptcy_and_rejoin() {
    let mut now = Utc::now();
    let mut state = new_game(true);
    for order in 1..=5u32 {
        let hints = if order == 1 {
            vec![
                "more than a busload".to_string(),
                "fewer than a million".to_string(),
            ]
        } else {
            vec![]
        };
        state
            .add_question(&format!("estimation question {order}"), 500, 10, order, hints)
            .unwrap();
    }
    let a = seat(&mut state, "tok-a", "ada", now);
    let b = seat(&mut state, "tok-b", "bob", now + Duration::seconds(1));
    let c = seat(&mut state, "tok-c", "cat", now + Duration::seconds(2));
    state.start(a, now).unwrap();

    // Questions one through three: ada wins each, cat calls it every time.
    for qi in 0..3 {
        let qid = state.questions[qi].question.id;
        state.submit_prediction(c, qid, a, now).unwrap();
        state.submit_guess(a, qid, 450, 550, true, now).unwrap();
        state.submit_guess(b, qid, 10, 100, true, now).unwrap();
        state.submit_guess(c, qid, 900, 2000, true, now).unwrap();
        check_through(&mut state, qid, &[a, b, c], now);
        let res = state.questions[qi].resolution.clone().unwrap();
        assert_eq!(res.winners, vec![a]);
        now += Duration::seconds(15);
        state.sweep(now);
    }
    assert!(state.questions[0].hints.iter().all(|h| h.is_revealed()));
    assert_eq!(
        state.questions[0].prediction_of(c).unwrap().is_correct,
        Some(true)
    );
    assert_eq!(player(&state, c).correct_preds, 3);
    // Question four is open and anted up.
    assert_eq!(state.questions[3].phase(), QuestionPhase::GuessingPhase);
    assert_eq!(chips(&state, a), 150);
    assert_eq!(chips(&state, b), 60);
    assert_eq!(chips(&state, c), 60);

    // Question four: cat shoves on a hopeless guess and goes bust, while
    // bob calls all in and takes the pot with the tighter range.
    let q4 = state.questions[3].question.id;
    state.submit_guess(a, q4, 400, 600, true, now).unwrap();
    state.submit_guess(b, q4, 450, 550, true, now).unwrap();
    state.submit_guess(c, q4, 1, 10, true, now).unwrap();
    state
        .submit_bet(c, q4, 1, BetAction::Raise, 60, now)
        .unwrap();
    state
        .submit_bet(a, q4, 1, BetAction::Call, 0, now)
        .unwrap();
    state
        .submit_bet(b, q4, 1, BetAction::Call, 0, now)
        .unwrap();
    assert_eq!(state.questions[3].phase(), QuestionPhase::BettingRound2);
    all_check(&mut state, q4, 2, &[a, b, c], now);
    all_check(&mut state, q4, 3, &[a, b, c], now);
    let res = state.questions[3].resolution.clone().unwrap();
    assert_eq!(res.pot_size, 210);
    assert_eq!(res.winners, vec![b]);
    assert_eq!(chips(&state, b), 210);
    assert_eq!(player(&state, c).status, PlayerStatus::Bankrupt);

    // Three correct calls buy cat back in before the next question opens.
    let revived = state.rejoin(c, now).unwrap();
    assert_eq!(revived.chips, 50);
    assert_eq!(revived.status, PlayerStatus::Active);

    now += Duration::seconds(15);
    state.sweep(now);
    assert_eq!(state.questions[4].phase(), QuestionPhase::GuessingPhase);
    assert_eq!(
        state.questions[4].standing_of(c),
        Some(Standing::ActiveForQuestion)
    );
    assert_eq!(chips(&state, c), 40);

    // Question five: the narrowest range wins it for the returner.
    let q5 = state.questions[4].question.id;
    state.submit_guess(a, q5, 490, 510, true, now).unwrap();
    state.submit_guess(b, q5, 400, 600, true, now).unwrap();
    state.submit_guess(c, q5, 498, 502, true, now).unwrap();
    check_through(&mut state, q5, &[a, b, c], now);
    assert_eq!(
        state.questions[4].resolution.as_ref().unwrap().winners,
        vec![c]
    );

    now += Duration::seconds(15);
    state.sweep(now);
    assert_eq!(state.game.status, GameStatus::Finished);
    assert_eq!(chips(&state, a), 80);
    assert_eq!(chips(&state, b), 200);
    assert_eq!(chips(&state, c), 70);
    // Three buy-ins plus one re-entry stake, not a chip more.
    let total: u32 = state.players.iter().map(|p| p.chips).sum();
    assert_eq!(total, 350);

    let events = state.drain_events();
    assert!(
        events
            .iter()
            .any(|e| e.entity == EntityKind::Game && e.kind == ChangeKind::Updated)
    );
}
