//! Integration tests for the Carcassonne engine

use carcassonne_core::edge::rotate_position;
use carcassonne_core::*;
use pretty_assertions::assert_eq;

fn tile(id: &str) -> Tile {
    Tile::new(&base_tile(id).expect("known tile"))
}

fn shield_cap() -> TileDefinition {
    TileDefinition::new(
        "shield-cap",
        1,
        vec![
            LocalZone::city(&[EdgeLabel::North]).with_shield().anchors(&[3]),
            LocalZone::field(&[
                EdgeLabel::EastTop,
                EdgeLabel::East,
                EdgeLabel::EastBottom,
                EdgeLabel::SouthLeft,
                EdgeLabel::South,
                EdgeLabel::SouthRight,
                EdgeLabel::WestTop,
                EdgeLabel::West,
                EdgeLabel::WestBottom,
            ])
            .touching(&[0])
            .anchors(&[18]),
        ],
    )
}

fn single(id: &str) -> TileDefinition {
    let mut def = base_tile(id).expect("known tile");
    def.quantity = 1;
    def
}

fn place(board: &mut Board, merger: &mut ZoneMerger, x: i32, y: i32, tile: Tile) {
    let coord = Coord::new(x, y);
    board.add_tile(coord, tile);
    merger.update_zones_for_new_tile(board, coord).unwrap();
}

fn knight(player: PlayerId) -> Meeple {
    Meeple {
        kind: MeepleKind::Knight,
        color: PlayerColor::for_player(player),
        player,
    }
}

#[test]
fn test_rotation_round_trip() {
    for label in EdgeLabel::ALL {
        for rotation in Rotation::ALL {
            assert_eq!(label.rotated(rotation).rotated(rotation.inverse()), label);
        }
        let mut turned = label;
        for _ in 0..4 {
            turned = turned.rotate_clockwise();
        }
        assert_eq!(turned, label);
    }
}

#[test]
fn test_opposite_edges_are_symmetric() {
    for label in EdgeLabel::ALL {
        assert_eq!(label.opposite().opposite(), label);
        assert_eq!(label.opposite().side(), label.side().opposite());
    }
    assert_eq!(EdgeLabel::NorthLeft.opposite(), EdgeLabel::SouthLeft);
    assert_eq!(EdgeLabel::EastTop.opposite(), EdgeLabel::WestTop);
}

#[test]
fn test_merge_member_count_independent_of_order() {
    let orders = [[0, 1, 2], [0, 2, 1], [2, 0, 1]];
    for order in orders {
        let mut board = Board::new();
        let mut merger = ZoneMerger::new();
        for i in order {
            place(&mut board, &mut merger, 0, i, tile("base-21"));
        }
        let road = merger
            .registry()
            .find_zone_containing(Coord::new(0, 0), 0)
            .unwrap();
        assert_eq!(road.members.len(), 3);
        assert_eq!(
            merger
                .registry()
                .zones()
                .filter(|z| z.zone_type == ZoneType::Road)
                .count(),
            1
        );
    }
}

#[test]
fn test_completion_is_monotonic() {
    let mut board = Board::new();
    let mut merger = ZoneMerger::new();
    place(&mut board, &mut merger, 50, 50, tile("base-05"));
    place(
        &mut board,
        &mut merger,
        50,
        49,
        tile("base-05").with_rotation(Rotation::R180),
    );
    let city = merger.registry().zone_id_of(Coord::new(50, 50), 0).unwrap();
    assert!(merger.registry().get(city).unwrap().is_complete);

    // Keep building around the closed city
    place(&mut board, &mut merger, 51, 50, tile("base-05"));
    place(&mut board, &mut merger, 49, 50, tile("base-05"));
    place(&mut board, &mut merger, 50, 51, tile("base-02"));
    assert!(merger.registry().get(city).unwrap().is_complete);
    assert!(merger.registry().is_city_closed(city));
}

#[test]
fn test_majority_tie_both_score_full_points() {
    let mut board = Board::new();
    let mut merger = ZoneMerger::new();
    place(&mut board, &mut merger, 0, 0, tile("base-05"));
    place(&mut board, &mut merger, 0, -1, tile("base-07"));
    place(
        &mut board,
        &mut merger,
        0,
        -2,
        tile("base-05").with_rotation(Rotation::R180),
    );

    let mut meeples = PlacedMeeples::new();
    meeples.insert(MeepleKey::new(Coord::new(0, 0), 3), knight(0));
    meeples.insert(
        MeepleKey::new(Coord::new(0, -2), rotate_position(3, Rotation::R180)),
        knight(1),
    );

    let scoring = Scorer::new(&board, &merger).score_closed_zones(&meeples);
    let mut points: Vec<(PlayerId, u32)> =
        scoring.awards.iter().map(|a| (a.player, a.points)).collect();
    points.sort();
    // Three tiles, no pennant
    assert_eq!(points, vec![(0, 6), (1, 6)]);
    assert_eq!(scoring.meeples_to_return.len(), 2);
}

#[test]
fn test_undo_twice_restores_turn_start() {
    let deck = Deck::from_definitions(&[single(START_TILE_ID), single("base-05")]);
    let mut game = GameSession::new(&["Ann", "Ben"], GameConfig::default(), deck).unwrap();
    let origin = game.config().origin;

    game.apply_action(0, GameAction::DrawTile).unwrap();
    game.apply_action(0, GameAction::PlaceTile(origin)).unwrap();
    game.apply_action(0, GameAction::EndTurn).unwrap();

    game.apply_action(1, GameAction::DrawTile).unwrap();
    let before = serde_json::to_value(game.snapshot()).unwrap();
    let ben_meeples = game.state().players[1].meeples;

    game.apply_action(1, GameAction::SetRotation(Rotation::R180))
        .unwrap();
    let north = Coord::new(50, 49);
    game.apply_action(1, GameAction::PlaceTile(north)).unwrap();
    game.apply_action(
        1,
        GameAction::PlaceMeeple {
            coord: north,
            position: rotate_position(3, Rotation::R180),
            kind: MeepleKind::Knight,
        },
    )
    .unwrap();

    game.apply_action(1, GameAction::Undo).unwrap();
    game.apply_action(1, GameAction::Undo).unwrap();

    assert_eq!(serde_json::to_value(game.snapshot()).unwrap(), before);
    assert_eq!(game.state().players[1].meeples, ben_meeples);
    assert_eq!(game.board().len(), 1);
    assert_eq!(game.phase(), TurnPhase::TileInHand);
    assert_eq!(game.tile_in_hand().unwrap().id, "base-05");
}

#[test]
fn test_city_closure_scores_six_and_returns_meeple() {
    let deck = Deck::from_definitions(&[single("base-05"), shield_cap()]);
    let mut game = GameSession::new(&["Ann", "Ben"], GameConfig::default(), deck).unwrap();
    let origin = game.config().origin;

    game.apply_action(0, GameAction::DrawTile).unwrap();
    game.apply_action(0, GameAction::PlaceTile(origin)).unwrap();
    game.apply_action(
        0,
        GameAction::PlaceMeeple {
            coord: origin,
            position: 3,
            kind: MeepleKind::Knight,
        },
    )
    .unwrap();
    game.apply_action(0, GameAction::EndTurn).unwrap();
    assert_eq!(game.state().players[0].meeples, 6);

    game.apply_action(1, GameAction::DrawTile).unwrap();
    game.apply_action(1, GameAction::SetRotation(Rotation::R180))
        .unwrap();
    let north = origin.step(Direction::North).unwrap();
    let events = game.apply_action(1, GameAction::PlaceTile(north)).unwrap();
    let city = game.registry().zone_id_of(origin, 0).unwrap();
    assert!(events.contains(&GameEvent::ZonesUpdated {
        touched: vec![city, game.registry().zone_id_of(north, 1).unwrap()],
        completed: vec![city],
    }));

    let zone = game.registry().get(city).unwrap();
    assert_eq!(zone.members.len(), 2);
    assert_eq!(zone.shields, 1);
    assert!(zone.is_complete);

    let events = game.apply_action(1, GameAction::EndTurn).unwrap();
    assert!(events.contains(&GameEvent::ScoresAwarded {
        awards: vec![ScoreAward {
            player: 0,
            points: 6,
            zone_type: ZoneType::City,
            zone: city,
        }],
        returned: vec![MeepleKey::new(origin, 3)],
    }));
    let ann = game.state().get_player(0).unwrap();
    assert_eq!(ann.score, 6);
    assert_eq!(ann.score_detail.cities, 6);
    assert_eq!(ann.meeples, 7);
    assert!(game.meeples().is_empty());

    // That was the last tile
    assert!(game.is_finished());
    assert_eq!(game.final_scores().unwrap()[0].total, 6);
}

#[test]
fn test_road_against_field_is_rejected() {
    let mut board = Board::new();
    board.add_tile(Coord::new(0, 0), tile("base-21"));
    // base-02 is a monastery surrounded by field
    assert!(!board.can_place_tile(Coord::new(0, -1), &tile("base-02")));
    assert!(!board.can_place_tile(Coord::new(0, 1), &tile("base-02")));
    // Its sides carry field, so the flanks are fine
    assert!(board.can_place_tile(Coord::new(1, 0), &tile("base-02")));
}

#[test]
fn test_deck_exhaustion_ends_game() {
    let mut deck = Deck::from_definitions(&[single(START_TILE_ID)]);
    assert!(deck.draw().is_some());
    assert!(deck.draw().is_none());

    // A session that only ever sees an empty pile
    let mut game = GameSession::new(&["Ann", "Ben"], GameConfig::default(), deck).unwrap();
    let events = game.apply_action(0, GameAction::DrawTile).unwrap();
    assert_eq!(events[0], GameEvent::DeckExhausted);
    assert!(matches!(events[1], GameEvent::GameEnded { .. }));
    assert_eq!(game.phase(), TurnPhase::Finished);
}

#[test]
fn test_field_scoring_counts_closed_cities() {
    let mut board = Board::new();
    let mut merger = ZoneMerger::new();
    place(&mut board, &mut merger, 0, 0, tile("base-08"));

    let mut meeples = PlacedMeeples::new();
    meeples.insert(
        MeepleKey::new(Coord::new(0, 0), 13),
        Meeple {
            kind: MeepleKind::Farmer,
            color: PlayerColor::for_player(0),
            player: 0,
        },
    );

    // Neither city is closed yet
    let awards = Scorer::new(&board, &merger).calculate_final_scores(&meeples);
    assert!(awards.iter().all(|a| a.zone_type != ZoneType::Field));

    place(
        &mut board,
        &mut merger,
        1,
        0,
        tile("base-05").with_rotation(Rotation::R270),
    );
    place(
        &mut board,
        &mut merger,
        -1,
        0,
        tile("base-05").with_rotation(Rotation::R90),
    );
    assert_eq!(merger.registry().closed_cities().len(), 2);

    let awards = Scorer::new(&board, &merger).calculate_final_scores(&meeples);
    let field: Vec<u32> = awards
        .iter()
        .filter(|a| a.zone_type == ZoneType::Field)
        .map(|a| a.points)
        .collect();
    assert_eq!(field, vec![6]);

    // Fields switched off score nothing
    let awards = Scorer::new(&board, &merger)
        .with_fields(false)
        .calculate_final_scores(&meeples);
    assert!(awards.is_empty());
}

#[test]
fn test_two_peers_stay_in_step() {
    let mut host = GameSync::new(0, Outbox::new(), Vec::new());
    let mut guest = GameSync::new(1, Outbox::new(), Vec::new());
    let deck = Deck::from_definitions(&[single("base-05"), shield_cap(), single("base-21")]);

    fn pump(from: &mut GameSync<Outbox, Vec<GameEvent>>, to: &mut GameSync<Outbox, Vec<GameEvent>>) {
        for (_, frame) in from.transport_mut().drain() {
            to.receive(&frame);
        }
    }

    host.start_game(&["Ann", "Ben"], GameConfig::default(), deck)
        .unwrap();
    pump(&mut host, &mut guest);
    let origin = GameConfig::default().origin;

    // Ann opens with a knight in the cap
    host.submit(GameAction::DrawTile).unwrap();
    host.submit(GameAction::PlaceTile(origin)).unwrap();
    host.submit(GameAction::PlaceMeeple {
        coord: origin,
        position: 3,
        kind: MeepleKind::Knight,
    })
    .unwrap();
    host.submit(GameAction::EndTurn).unwrap();
    pump(&mut host, &mut guest);

    // Ben closes the city and scores it for Ann
    guest.submit(GameAction::DrawTile).unwrap();
    guest
        .submit(GameAction::SetRotation(Rotation::R180))
        .unwrap();
    guest
        .submit(GameAction::PlaceTile(origin.step(Direction::North).unwrap()))
        .unwrap();
    guest.submit(GameAction::EndTurn).unwrap();
    pump(&mut guest, &mut host);

    let h = host.session().unwrap();
    let g = guest.session().unwrap();
    assert_eq!(h.board(), g.board());
    assert_eq!(h.registry(), g.registry());
    assert_eq!(h.meeples(), g.meeples());
    assert_eq!(h.state(), g.state());
    assert_eq!(h.state().players[0].score, 6);
    assert!(h.state().is_player_turn(0));

    // Host's own echoes are dropped
    let echoed = serde_json::to_string(&Envelope {
        origin: 0,
        message: NetMessage::TileRotated {
            rotation: Rotation::R90,
        },
    })
    .unwrap();
    assert!(host.receive(&echoed).is_empty());
}
