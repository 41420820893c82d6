//! Built-in tile set of the base game.
//!
//! 24 tile kinds, `base-01` through `base-24`, 72 tiles in total. `base-04`
//! (city on top, straight road through the middle) is the starting tile.
//!
//! Layout conventions:
//! - city and road zones are declared on plain side labels
//! - field zones are declared on sub-edges, and a side that is entirely
//!   field lists all three of its labels
//! - meeple anchors index a 5x5 grid, row-major, 1 at the top-left

use crate::edge::EdgeLabel::*;
use crate::tile::{LocalZone, TileDefinition};

/// Id of the tile every standard game starts with
pub const START_TILE_ID: &str = "base-04";

/// Tiles in a full base deck
pub const BASE_TILE_COUNT: u32 = 72;

/// The 24 base tile kinds with their quantities
pub fn base_tiles() -> Vec<TileDefinition> {
    vec![
        // Monastery with a road leaving south
        TileDefinition::new(
            "base-01",
            2,
            vec![
                LocalZone::monastery().anchors(&[13]),
                LocalZone::road(&[South]).anchors(&[23]),
                LocalZone::field(&[
                    NorthLeft, North, NorthRight, EastTop, East, EastBottom, SouthLeft,
                    SouthRight, WestTop, West, WestBottom,
                ])
                .anchors(&[7]),
            ],
        ),
        // Monastery in an open field
        TileDefinition::new(
            "base-02",
            4,
            vec![
                LocalZone::monastery().anchors(&[13]),
                LocalZone::field(&[
                    NorthLeft, North, NorthRight, EastTop, East, EastBottom, SouthLeft, South,
                    SouthRight, WestTop, West, WestBottom,
                ])
                .anchors(&[7]),
            ],
        ),
        // City on every side
        TileDefinition::new(
            "base-03",
            1,
            vec![LocalZone::city(&[North, East, South, West])
                .with_shield()
                .anchors(&[13])],
        ),
        // City cap above a straight east-west road
        TileDefinition::new(
            "base-04",
            4,
            vec![
                LocalZone::city(&[North]).anchors(&[3]),
                LocalZone::field(&[EastTop, WestTop]).touching(&[0]).anchors(&[8]),
                LocalZone::road(&[East, West]).anchors(&[13]),
                LocalZone::field(&[EastBottom, SouthLeft, South, SouthRight, WestBottom])
                    .anchors(&[23]),
            ],
        ),
        // City cap
        TileDefinition::new(
            "base-05",
            5,
            vec![
                LocalZone::city(&[North]).anchors(&[3]),
                LocalZone::field(&[
                    EastTop, East, EastBottom, SouthLeft, South, SouthRight, WestTop, West,
                    WestBottom,
                ])
                .touching(&[0])
                .anchors(&[18]),
            ],
        ),
        // City band east-west with pennant
        TileDefinition::new(
            "base-06",
            2,
            vec![
                LocalZone::city(&[East, West]).with_shield().anchors(&[13]),
                LocalZone::field(&[NorthLeft, North, NorthRight])
                    .touching(&[0])
                    .anchors(&[3]),
                LocalZone::field(&[SouthLeft, South, SouthRight])
                    .touching(&[0])
                    .anchors(&[23]),
            ],
        ),
        // City band north-south
        TileDefinition::new(
            "base-07",
            1,
            vec![
                LocalZone::city(&[North, South]).anchors(&[13]),
                LocalZone::field(&[WestTop, West, WestBottom])
                    .touching(&[0])
                    .anchors(&[11]),
                LocalZone::field(&[EastTop, East, EastBottom])
                    .touching(&[0])
                    .anchors(&[15]),
            ],
        ),
        // Two separate city caps on opposite sides
        TileDefinition::new(
            "base-08",
            3,
            vec![
                LocalZone::city(&[East]).anchors(&[15]),
                LocalZone::city(&[West]).anchors(&[11]),
                LocalZone::field(&[
                    NorthLeft, North, NorthRight, SouthLeft, South, SouthRight,
                ])
                .touching(&[0, 1])
                .anchors(&[13]),
            ],
        ),
        // Two separate city caps on adjacent sides
        TileDefinition::new(
            "base-09",
            2,
            vec![
                LocalZone::city(&[East]).anchors(&[15]),
                LocalZone::city(&[South]).anchors(&[23]),
                LocalZone::field(&[
                    NorthLeft, North, NorthRight, WestTop, West, WestBottom,
                ])
                .touching(&[0, 1])
                .anchors(&[7]),
            ],
        ),
        // City cap, road curving east to south
        TileDefinition::new(
            "base-10",
            3,
            vec![
                LocalZone::city(&[North]).anchors(&[3]),
                LocalZone::road(&[East, South]).anchors(&[19]),
                LocalZone::field(&[EastBottom, SouthRight]).anchors(&[25]),
                LocalZone::field(&[EastTop, SouthLeft, WestTop, West, WestBottom])
                    .touching(&[0])
                    .anchors(&[12]),
            ],
        ),
        // City cap, road curving west to south
        TileDefinition::new(
            "base-11",
            3,
            vec![
                LocalZone::city(&[North]).anchors(&[3]),
                LocalZone::road(&[West, South]).anchors(&[17]),
                LocalZone::field(&[WestBottom, SouthLeft]).anchors(&[21]),
                LocalZone::field(&[WestTop, EastTop, East, EastBottom, SouthRight])
                    .touching(&[0])
                    .anchors(&[14]),
            ],
        ),
        // City cap above a three-way crossing
        TileDefinition::new(
            "base-12",
            3,
            vec![
                LocalZone::city(&[North]).anchors(&[3]),
                LocalZone::field(&[EastTop, WestTop]).touching(&[0]).anchors(&[8]),
                LocalZone::road(&[East]).anchors(&[15]),
                LocalZone::road(&[South]).anchors(&[23]),
                LocalZone::road(&[West]).anchors(&[11]),
                LocalZone::field(&[EastBottom, SouthRight]).anchors(&[25]),
                LocalZone::field(&[SouthLeft, WestBottom]).anchors(&[21]),
            ],
        ),
        // City corner north-west with pennant
        TileDefinition::new(
            "base-13",
            2,
            vec![
                LocalZone::city(&[North, West]).with_shield().anchors(&[7]),
                LocalZone::field(&[
                    EastTop, East, EastBottom, SouthLeft, South, SouthRight,
                ])
                .touching(&[0])
                .anchors(&[19]),
            ],
        ),
        // City corner north-west
        TileDefinition::new(
            "base-14",
            3,
            vec![
                LocalZone::city(&[North, West]).anchors(&[7]),
                LocalZone::field(&[
                    EastTop, East, EastBottom, SouthLeft, South, SouthRight,
                ])
                .touching(&[0])
                .anchors(&[19]),
            ],
        ),
        // City corner with pennant, road curving east to south
        TileDefinition::new(
            "base-15",
            2,
            vec![
                LocalZone::city(&[North, West]).with_shield().anchors(&[7]),
                LocalZone::road(&[East, South]).anchors(&[19]),
                LocalZone::field(&[EastBottom, SouthRight]).anchors(&[25]),
                LocalZone::field(&[EastTop, SouthLeft])
                    .touching(&[0])
                    .anchors(&[13]),
            ],
        ),
        // City corner, road curving east to south
        TileDefinition::new(
            "base-16",
            3,
            vec![
                LocalZone::city(&[North, West]).anchors(&[7]),
                LocalZone::road(&[East, South]).anchors(&[19]),
                LocalZone::field(&[EastBottom, SouthRight]).anchors(&[25]),
                LocalZone::field(&[EastTop, SouthLeft])
                    .touching(&[0])
                    .anchors(&[13]),
            ],
        ),
        // City on three sides with pennant
        TileDefinition::new(
            "base-17",
            1,
            vec![
                LocalZone::city(&[North, East, West]).with_shield().anchors(&[8]),
                LocalZone::field(&[SouthLeft, South, SouthRight])
                    .touching(&[0])
                    .anchors(&[23]),
            ],
        ),
        // City on three sides
        TileDefinition::new(
            "base-18",
            3,
            vec![
                LocalZone::city(&[North, East, West]).anchors(&[8]),
                LocalZone::field(&[SouthLeft, South, SouthRight])
                    .touching(&[0])
                    .anchors(&[23]),
            ],
        ),
        // City on three sides with pennant, road leaving south
        TileDefinition::new(
            "base-19",
            2,
            vec![
                LocalZone::city(&[North, East, West]).with_shield().anchors(&[8]),
                LocalZone::road(&[South]).anchors(&[23]),
                LocalZone::field(&[SouthLeft]).touching(&[0]).anchors(&[21]),
                LocalZone::field(&[SouthRight]).touching(&[0]).anchors(&[25]),
            ],
        ),
        // City on three sides, road leaving south
        TileDefinition::new(
            "base-20",
            1,
            vec![
                LocalZone::city(&[North, East, West]).anchors(&[8]),
                LocalZone::road(&[South]).anchors(&[23]),
                LocalZone::field(&[SouthLeft]).touching(&[0]).anchors(&[21]),
                LocalZone::field(&[SouthRight]).touching(&[0]).anchors(&[25]),
            ],
        ),
        // Straight road north-south
        TileDefinition::new(
            "base-21",
            8,
            vec![
                LocalZone::road(&[North, South]).anchors(&[13]),
                LocalZone::field(&[NorthLeft, WestTop, West, WestBottom, SouthLeft])
                    .anchors(&[11]),
                LocalZone::field(&[NorthRight, EastTop, East, EastBottom, SouthRight])
                    .anchors(&[15]),
            ],
        ),
        // Road curving west to south
        TileDefinition::new(
            "base-22",
            9,
            vec![
                LocalZone::road(&[West, South]).anchors(&[17]),
                LocalZone::field(&[WestBottom, SouthLeft]).anchors(&[21]),
                LocalZone::field(&[
                    NorthLeft, North, NorthRight, EastTop, East, EastBottom, SouthRight,
                    WestTop,
                ])
                .anchors(&[9]),
            ],
        ),
        // Three-way crossing
        TileDefinition::new(
            "base-23",
            4,
            vec![
                LocalZone::field(&[NorthLeft, North, NorthRight, EastTop, WestTop]).anchors(&[3]),
                LocalZone::road(&[East]).anchors(&[15]),
                LocalZone::road(&[South]).anchors(&[23]),
                LocalZone::road(&[West]).anchors(&[11]),
                LocalZone::field(&[EastBottom, SouthRight]).anchors(&[25]),
                LocalZone::field(&[SouthLeft, WestBottom]).anchors(&[21]),
            ],
        ),
        // Four-way crossing
        TileDefinition::new(
            "base-24",
            1,
            vec![
                LocalZone::road(&[North]).anchors(&[3]),
                LocalZone::road(&[East]).anchors(&[15]),
                LocalZone::road(&[South]).anchors(&[23]),
                LocalZone::road(&[West]).anchors(&[11]),
                LocalZone::field(&[NorthRight, EastTop]).anchors(&[5]),
                LocalZone::field(&[EastBottom, SouthRight]).anchors(&[25]),
                LocalZone::field(&[SouthLeft, WestBottom]).anchors(&[21]),
                LocalZone::field(&[WestTop, NorthLeft]).anchors(&[1]),
            ],
        ),
    ]
}

/// Look up a base tile kind by id
pub fn base_tile(id: &str) -> Option<TileDefinition> {
    base_tiles().into_iter().find(|def| def.id == id)
}
