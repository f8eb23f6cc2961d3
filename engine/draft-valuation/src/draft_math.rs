//! Snake-draft pick arithmetic
//!
//! Overall picks are 1-based. Odd rounds run slot 1..=teams, even rounds run
//! back from slot `teams` to slot 1. The "column" of a pick is the draft slot
//! that owns it.

/// Round containing an overall pick
pub fn round_of(overall: u32, teams: u32) -> u32 {
    overall.saturating_sub(1) / teams + 1
}

/// 1-based position of an overall pick within its round
pub fn pick_in_round(overall: u32, teams: u32) -> u32 {
    overall.saturating_sub(1) % teams + 1
}

/// Round and owning draft slot for an overall pick
pub fn overall_pick_to_round_and_column(overall: u32, teams: u32) -> (u32, u32) {
    let round = round_of(overall, teams);
    let pick = pick_in_round(overall, teams);
    let column = if round % 2 == 1 { pick } else { teams - pick + 1 };
    (round, column)
}

/// Overall pick number for a round and in-round pick
pub fn overall_from_round_and_pick(round: u32, pick_in_round: u32, teams: u32) -> u32 {
    round.saturating_sub(1) * teams + pick_in_round
}

/// Overall pick owned by `slot` in `round`
pub fn user_pick_overall(round: u32, slot: u32, teams: u32) -> u32 {
    if round % 2 == 1 {
        (round - 1) * teams + slot
    } else {
        round * teams - (slot - 1)
    }
}

/// The first pick at or after `overall` that belongs to `slot`
pub fn next_user_pick(overall: u32, slot: u32, teams: u32) -> u32 {
    let overall = overall.max(1);
    let round = round_of(overall, teams);
    let in_round = user_pick_overall(round, slot, teams);
    if in_round >= overall {
        in_round
    } else {
        user_pick_overall(round + 1, slot, teams)
    }
}

/// The user's next two picks at or after `overall`
pub fn next_two_user_picks(overall: u32, slot: u32, teams: u32) -> (u32, u32) {
    let first = next_user_pick(overall, slot, teams);
    let second = next_user_pick(first + 1, slot, teams);
    (first, second)
}

/// Picks made by others before the user is next on the clock
pub fn picks_until_user(overall: u32, slot: u32, teams: u32) -> u32 {
    next_user_pick(overall, slot, teams) - overall.max(1)
}

/// Display form of an overall pick, e.g. "3.07"
pub fn format_pick(overall: u32, teams: u32) -> String {
    format!("{}.{:02}", round_of(overall, teams), pick_in_round(overall, teams))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_and_column_snake() {
        // 10 teams: pick 1 is slot 1, pick 10 is slot 10, pick 11 is slot 10 again
        assert_eq!(overall_pick_to_round_and_column(1, 10), (1, 1));
        assert_eq!(overall_pick_to_round_and_column(10, 10), (1, 10));
        assert_eq!(overall_pick_to_round_and_column(11, 10), (2, 10));
        assert_eq!(overall_pick_to_round_and_column(20, 10), (2, 1));
        assert_eq!(overall_pick_to_round_and_column(21, 10), (3, 1));
        assert_eq!(overall_pick_to_round_and_column(27, 10), (3, 7));
    }

    #[test]
    fn test_user_pick_overall_matches_column() {
        let teams = 12;
        for round in 1..=15 {
            for slot in 1..=teams {
                let overall = user_pick_overall(round, slot, teams);
                assert_eq!(overall_pick_to_round_and_column(overall, teams), (round, slot));
            }
        }
    }

    #[test]
    fn test_next_user_pick() {
        // Slot 7 of 10 picks at 7, 14, 27, 34
        assert_eq!(next_user_pick(1, 7, 10), 7);
        assert_eq!(next_user_pick(7, 7, 10), 7);
        assert_eq!(next_user_pick(8, 7, 10), 14);
        assert_eq!(next_user_pick(15, 7, 10), 27);
        assert_eq!(next_two_user_picks(1, 7, 10), (7, 14));
        assert_eq!(next_two_user_picks(14, 7, 10), (14, 27));
    }

    #[test]
    fn test_turn_slots_pick_back_to_back() {
        assert_eq!(next_two_user_picks(1, 10, 10), (10, 11));
        assert_eq!(next_two_user_picks(12, 1, 10), (20, 21));
    }

    #[test]
    fn test_picks_until_user() {
        assert_eq!(picks_until_user(1, 7, 10), 6);
        assert_eq!(picks_until_user(7, 7, 10), 0);
        assert_eq!(picks_until_user(8, 7, 10), 6);
    }

    #[test]
    fn test_format_pick() {
        assert_eq!(format_pick(1, 10), "1.01");
        assert_eq!(format_pick(27, 10), "3.07");
        assert_eq!(overall_from_round_and_pick(3, 7, 10), 27);
    }
}
