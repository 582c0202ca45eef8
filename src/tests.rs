#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::cell::{Cell, EndpointRole};
    use crate::direction::Direction;
    use crate::grid::{Grid, GridParseError};
    use crate::location::Location;
    use crate::path::{Path, PathStep};
    use crate::solver::{find_paths, Enumeration, PathCap, SolveError, Solver};

    fn all_paths(grid: &mut Grid, label: &str, cap: PathCap) -> Enumeration {
        let pair = grid.pair_named(label).cloned().unwrap();
        grid.with_pair_state(&pair, Cell::Traversable, |grid| {
            find_paths(grid, &pair, &mut HashSet::new(), false, cap)
        })
    }

    #[test]
    fn parse_expands_runs_and_pads() {
        let grid: Grid = "3.1,0,1.-2,1".parse().unwrap();

        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.total_traversable(), 6);
        assert_eq!(format!("{}", grid), "...
.#.
##.
");
    }

    #[test]
    fn parse_rejects_label_cardinality() {
        assert!(matches!(
            "1,A.1,1".parse::<Grid>(),
            Err(GridParseError::LabelCardinality { label, positions }) if label == "A" && positions.len() == 1
        ));
        assert!(matches!(
            "A,A.A,1".parse::<Grid>(),
            Err(GridParseError::LabelCardinality { label, positions }) if label == "A" && positions.len() == 3
        ));
        assert!(matches!("".parse::<Grid>(), Err(GridParseError::Empty)));
    }

    #[test]
    fn parse_records_pairs_in_reading_order() {
        let grid: Grid = "A,1.A,B.1,B".parse().unwrap();

        assert_eq!(grid.pairs().len(), 2);
        assert_eq!(grid.pairs()[0].label(), "A");
        assert_eq!(grid.pairs()[0].start(), Location(0, 0));
        assert_eq!(grid.pairs()[0].end(), Location(0, 1));
        assert_eq!(grid.pairs()[1].label(), "B");
        assert_eq!(format!("{}", grid), "A.
AB
.B
");
    }

    #[test]
    fn endpoint_lookup_tracks_activation() {
        let mut grid: Grid = "A,1.A,1".parse().unwrap();

        let (pair, role) = grid.endpoint_at(Location(0, 0)).unwrap();
        assert_eq!(pair.label(), "A");
        assert_eq!(role, EndpointRole::Start);
        assert_eq!(grid.endpoint_at(Location(0, 1)).unwrap().1, EndpointRole::End);
        assert_eq!(grid.endpoint_at(Location(1, 0)), None);
        assert_eq!(grid.endpoint_at(Location(9, 9)), None);

        let pair = grid.pair_named("A").cloned().unwrap();
        grid.activate_pair(&pair, Cell::Traversable);
        assert_eq!(grid.endpoint_at(Location(0, 0)), None);
        grid.restore();
        assert!(grid.endpoint_at(Location(0, 0)).is_some());
    }

    #[test]
    fn enumerates_every_simple_path() {
        // 3x3, all traversable, endpoints at opposite corners: 12 simple
        // paths, enumerable by hand (6 through each of the corner's two
        // first moves).
        let mut grid: Grid = "A,1,1.1,1,1.1,1,A".parse().unwrap();

        let Enumeration::Found(paths) = all_paths(&mut grid, "A", PathCap::Unlimited) else {
            panic!("uncapped enumeration must complete");
        };

        assert_eq!(paths.len(), 12);

        let mut seen = HashSet::new();
        for path in &paths {
            let cells = path.cells();
            assert_eq!(*cells.first().unwrap(), Location(0, 0));
            assert_eq!(*cells.last().unwrap(), Location(2, 2));
            assert_eq!(cells.iter().collect::<HashSet<_>>().len(), cells.len());
            assert_eq!(path.steps().last(), Some(&PathStep::Arrived));
            assert!(seen.insert(path.steps().to_vec()));
        }

        // fixed move order (up, down, left, right) makes the deepest
        // down-first walk come out first
        assert_eq!(format!("{}", paths[0]), "v,v,>,^,^,>,v,v");
    }

    #[test]
    fn adjacent_endpoints_still_carry_the_arrival_marker() {
        let mut grid: Grid = "A,A.1,1".parse().unwrap();

        let Enumeration::Found(paths) = all_paths(&mut grid, "A", PathCap::Unlimited) else {
            panic!("uncapped enumeration must complete");
        };

        assert_eq!(paths.len(), 2);
        // down sorts before right in the move order, so the detour through
        // the bottom row comes out ahead of the one-step path
        assert_eq!(
            paths[0].steps(),
            &[
                PathStep::Move(Direction::Down),
                PathStep::Move(Direction::Right),
                PathStep::Move(Direction::Up),
                PathStep::Arrived,
            ]
        );
        assert_eq!(
            paths[1].steps(),
            &[PathStep::Move(Direction::Right), PathStep::Arrived]
        );
        assert!(paths.iter().all(|path| path.steps().last() == Some(&PathStep::Arrived)));
    }

    #[test]
    fn cap_yields_sentinel_not_truncated_list() {
        let mut grid: Grid = "A,1,1.1,1,1.1,1,A".parse().unwrap();

        assert_eq!(all_paths(&mut grid, "A", PathCap::AtMost(5)), Enumeration::CapReached);
        // 12 paths exist, so a cap of 12 is also reached, while 13 is not
        assert_eq!(all_paths(&mut grid, "A", PathCap::AtMost(12)), Enumeration::CapReached);
        assert!(matches!(
            all_paths(&mut grid, "A", PathCap::AtMost(13)),
            Enumeration::Found(paths) if paths.len() == 12
        ));
    }

    #[test]
    fn no_path_is_an_empty_list_not_the_sentinel() {
        let mut grid: Grid = "A,0,A".parse().unwrap();

        assert_eq!(
            all_paths(&mut grid, "A", PathCap::AtMost(1)),
            Enumeration::Found(vec![])
        );
    }

    #[test]
    fn interior_pocket_is_not_perimeter() {
        // lone blocked cell in the center of a 5x5, touching no border
        let mut grid: Grid = "5.5.2,0,2.5.5".parse().unwrap();

        assert!(!grid.is_perimeter(Location(1, 1), None));
        assert!(!grid.is_perimeter(Location(1, 2), None));
        assert!(!grid.is_perimeter(Location(3, 3), None));
        assert!(grid.is_perimeter(Location(0, 2), None));
        assert!(grid.is_perimeter(Location(4, 4), None));
    }

    #[test]
    fn border_connected_blockage_is_perimeter() {
        // blocked column from the center down to the bottom border
        let mut grid: Grid = "5.5.2,0,2.2,0,2.2,0,2".parse().unwrap();

        assert!(grid.is_perimeter(Location(1, 1), None));
        assert!(grid.is_perimeter(Location(3, 3), None));
    }

    #[test]
    fn excluded_pair_endpoints_count_as_walls() {
        // A's endpoints form a column reaching the top border; they only
        // read as a border-connected blockage while A is excluded
        let mut grid: Grid = "2,A,2.2,A,2.5.5.5".parse().unwrap();
        let pair = grid.pair_named("A").cloned().unwrap();

        assert!(grid.is_perimeter(Location(1, 1), Some(&pair)));
        assert!(!grid.is_perimeter(Location(1, 1), None));
    }

    #[test]
    fn activations_restore_exactly() {
        let mut grid: Grid = "A,B,1.1,1,1.A,1,B".parse().unwrap();
        let before = format!("{}", grid);
        let total_before = grid.total_traversable();

        let pair = grid.pair_named("A").cloned().unwrap();
        let path = Path {
            label: "A".to_owned(),
            start: Location(0, 0),
            end: Location(0, 2),
            steps: vec![
                PathStep::Move(Direction::Down),
                PathStep::Move(Direction::Down),
                PathStep::Arrived,
            ],
        };

        grid.activate_pair(&pair, Cell::Traversable);
        assert_eq!(grid.total_traversable(), total_before);

        grid.activate_path(&path, Cell::Blocked, 1);
        // one unsolved pair left, and the path consumed one traversable cell
        assert_eq!(grid.total_traversable(), 4 + 2);

        grid.restore();
        grid.restore();
        assert_eq!(format!("{}", grid), before);
        assert_eq!(grid.total_traversable(), total_before);
    }

    #[test]
    fn cap_aborted_enumeration_restores_the_grid() {
        let mut grid: Grid = "A,1,1.1,1,1.1,1,A".parse().unwrap();
        let before = format!("{}", grid);

        assert_eq!(all_paths(&mut grid, "A", PathCap::AtMost(3)), Enumeration::CapReached);
        assert_eq!(format!("{}", grid), before);
    }

    #[test]
    fn solve_finds_every_exact_cover() {
        let mut grid: Grid = "A,B,1.1,1,1.A,1,B".parse().unwrap();
        let total = grid.total_traversable();

        let solutions = Solver::new(&mut grid).cap(PathCap::Unlimited).solve().unwrap();
        assert_eq!(solutions.len(), 2);

        for solution in &solutions {
            let mut covered = HashSet::new();
            for path in solution.paths() {
                for cell in path.cells() {
                    // pairwise disjoint: no cell claimed twice
                    assert!(covered.insert(cell));
                }
            }
            // exact cover: every traversable cell claimed
            assert_eq!(covered.len(), total);
        }

        assert_eq!(grid.render_paths(solutions[0].paths()), "ABb
abb
AbB
");
    }

    #[test]
    fn unsolvable_grid_reports_no_solutions() {
        // the two pockets cannot be covered by any two disjoint paths
        let mut grid: Grid = "A,0,A.-1,1,0.B,B,1".parse().unwrap();

        let solutions = Solver::new(&mut grid).cap(PathCap::Unlimited).solve().unwrap();
        assert!(solutions.is_empty());
    }

    #[test]
    fn truncated_candidate_lists_abort_the_assignment_search() {
        let mut grid: Grid = "A,B,1.1,1,1.A,1,B".parse().unwrap();
        let before = format!("{}", grid);

        let result = Solver::new(&mut grid).cap(PathCap::AtMost(1)).solve();
        assert!(matches!(
            result,
            Err(SolveError::CapExceeded { cap: 1, .. })
        ));
        // the error path unwinds every activation too
        assert_eq!(format!("{}", grid), before);
    }

    #[test]
    fn fast_mode_stops_at_the_first_solution() {
        let mut grid: Grid = "A,B,1.1,1,1.A,1,B".parse().unwrap();

        let solutions = Solver::new(&mut grid)
            .cap(PathCap::Unlimited)
            .fast_mode(true)
            .solve()
            .unwrap();
        assert_eq!(solutions.len(), 1);
    }

    #[test]
    fn perimeter_prepass_agrees_with_the_plain_search() {
        let mut grid: Grid = "A,B,1.1,1,1.A,1,B".parse().unwrap();
        let plain_solutions = Solver::new(&mut grid).cap(PathCap::Unlimited).solve().unwrap();
        let plain: HashSet<String> = plain_solutions
            .iter()
            .map(|solution| grid.render_paths(solution.paths()))
            .collect();

        let prepass_solutions = Solver::new(&mut grid)
            .cap(PathCap::Unlimited)
            .perimeter_prepass(true)
            .solve()
            .unwrap();
        let prepass: HashSet<String> = prepass_solutions
            .iter()
            .map(|solution| grid.render_paths(solution.paths()))
            .collect();

        assert_eq!(plain.len(), 2);
        assert_eq!(plain, prepass);
    }

    #[test]
    fn probe_perimeter_paths_reports_the_full_list() {
        let mut grid: Grid = "A,B,1.1,1,1.A,1,B".parse().unwrap();

        let mut solver = Solver::new(&mut grid);
        solver.cap(PathCap::Unlimited);
        assert!(matches!(
            solver.probe_perimeter_paths("A").unwrap(),
            Enumeration::Found(paths) if paths.len() == 2
        ));
        assert!(matches!(
            solver.probe_perimeter_paths("Z"),
            Err(SolveError::UnknownLabel(label)) if label == "Z"
        ));
    }

    #[test]
    fn hardcoded_override_is_spliced_unchanged() {
        let mut grid: Grid = "A,B,1.1,1,1.A,1,B".parse().unwrap();

        let solutions = Solver::new(&mut grid)
            .cap(PathCap::Unlimited)
            .hardcode("A", "v,v")
            .solve()
            .unwrap();

        // forcing A down the left column leaves B exactly one cover
        assert_eq!(solutions.len(), 1);
        let fixed = solutions[0]
            .paths()
            .iter()
            .find(|path| path.label() == "A")
            .unwrap();
        assert_eq!(
            fixed.steps(),
            &[
                PathStep::Move(Direction::Down),
                PathStep::Move(Direction::Down),
                PathStep::Arrived,
            ]
        );
        assert_eq!(grid.render_paths(solutions[0].paths()), "ABb
abb
AbB
");
    }

    #[test]
    fn hardcoded_override_must_stay_in_bounds() {
        let mut grid: Grid = "A,B,1.1,1,1.A,1,B".parse().unwrap();
        let before = format!("{}", grid);

        let result = Solver::new(&mut grid).hardcode("A", "^").solve();
        assert!(matches!(
            result,
            Err(SolveError::OverrideOutOfBounds { label, .. }) if label == "A"
        ));
        assert_eq!(format!("{}", grid), before);
    }

    #[test]
    fn hardcoded_override_rejects_bad_tokens() {
        let mut grid: Grid = "A,B,1.1,1,1.A,1,B".parse().unwrap();

        assert!(matches!(
            Solver::new(&mut grid).hardcode("A", "x").solve(),
            Err(SolveError::BadOverride { label, .. }) if label == "A"
        ));
        assert!(matches!(
            Solver::new(&mut grid).hardcode("Z", "v").solve(),
            Err(SolveError::UnknownLabel(label)) if label == "Z"
        ));
    }

    #[test]
    fn move_sequences_round_trip() {
        let steps = Path::parse_steps("^,v,<,>").unwrap();
        assert_eq!(
            steps,
            vec![
                PathStep::Move(Direction::Up),
                PathStep::Move(Direction::Down),
                PathStep::Move(Direction::Left),
                PathStep::Move(Direction::Right),
                PathStep::Arrived,
            ]
        );

        let path = Path {
            label: "A".to_owned(),
            start: Location(1, 1),
            end: Location(1, 1),
            steps,
        };
        // the arrival marker never leaks into the external encoding
        assert_eq!(format!("{}", path), "^,v,<,>");

        assert!(Path::parse_steps("q").is_err());
        assert!(Path::parse_steps("").is_err());
    }
}
