use tilegrid::collision::hitbox::collides_with_point_high_res;
use tilegrid::{Grid, GridError, IVec2, Tile, TileLayer, Xf, TILE_SIZE, TILE_SIZE_HIGH_RES};

fn layer_grid(width: i32, height: i32, data: Vec<i32>, xf: Xf) -> Grid {
    Grid::from_layer(&TileLayer::new(width, height, data), xf).unwrap()
}

fn single(tile: Tile, pos: IVec2) -> Grid {
    layer_grid(1, 1, vec![tile as i32], Xf::from_pos(pos))
}

#[test]
fn test_from_layer_rejects_bad_index() {
    let err = Grid::from_layer(&TileLayer::new(2, 1, vec![1, 7]), Xf::IDENTITY).unwrap_err();
    assert_eq!(
        err,
        GridError::TileOutOfRange {
            value: 7,
            pos: IVec2::new(1, 0)
        }
    );

    let err = Grid::from_layer(&TileLayer::new(-1, 2, vec![]), Xf::IDENTITY).unwrap_err();
    assert!(matches!(err, GridError::NegativeSize { .. }));
}

#[test]
fn test_from_layer_trims_and_places() {
    let grid = layer_grid(
        3,
        3,
        vec![0, 0, 0, 0, 1, 0, 0, 0, 0],
        Xf::from_pos(IVec2::new(100, 50)),
    );
    assert_eq!(grid.size(), IVec2::ONE);
    assert_eq!(grid.mass(), 2);

    let aabb = grid.world_aabb(Xf::IDENTITY);
    assert_eq!(aabb.min, IVec2::new(112, 62));
    assert_eq!(aabb.max, IVec2::new(124, 74));

    let empty = layer_grid(2, 2, vec![0; 4], Xf::IDENTITY);
    assert!(empty.is_empty());
    assert_eq!(empty.mass(), 0);
}

#[test]
fn test_square_point_queries() {
    let grid = single(Tile::Wall, IVec2::ZERO);
    assert!(grid.collides_with_point_in_world_space(IVec2::new(0, 0)));
    assert!(grid.collides_with_point_in_world_space(IVec2::new(11, 11)));
    assert!(!grid.collides_with_point_in_world_space(IVec2::new(12, 0)));
    assert!(!grid.collides_with_point_in_world_space(IVec2::new(-1, 5)));
}

#[test]
fn test_wedge_point_queries() {
    // Top-left corner missing.
    let grid = single(Tile::WallA, IVec2::ZERO);
    assert!(!grid.collides_with_point_in_grid_space(IVec2::new(0, 0)));
    assert!(!grid.collides_with_point_in_grid_space(IVec2::new(5, 5)));
    assert!(grid.collides_with_point_in_grid_space(IVec2::new(6, 6)));
    assert!(grid.collides_with_point_in_grid_space(IVec2::new(11, 11)));
    // Pixels cut by the diagonal count as solid.
    assert!(grid.collides_with_point_in_grid_space(IVec2::new(11, 0)));
    assert!(grid.collides_with_point_in_grid_space(IVec2::new(0, 11)));
}

#[test]
fn test_rotated_grid_keeps_shape() {
    let data = vec![Tile::Wall as i32, Tile::WallA as i32];
    for rot in 0..4 {
        let grid = layer_grid(2, 1, data.clone(), Xf::new(IVec2::new(50, 40), rot));
        let to_world = grid.grid_to_world();
        for y in -2..14 {
            for x in -2..26 {
                let pixel = IVec2::new(x, y);
                assert_eq!(
                    grid.collides_with_point_in_world_space(to_world.transform_pixel(pixel)),
                    grid.collides_with_point_in_grid_space(pixel),
                    "rot {rot}, pixel {pixel}"
                );
            }
        }
        assert_eq!(
            grid.world_pixel_to_tile(to_world.transform_pixel(IVec2::new(13, 4))),
            IVec2::new(1, 0)
        );
    }
}

#[test]
fn test_complementary_wedges_do_not_collide() {
    let a = single(Tile::WallA, IVec2::ZERO);
    let c = single(Tile::WallC, IVec2::ZERO);
    assert!(!a.collides_with_grid_with_offsets(Xf::IDENTITY, &c, Xf::IDENTITY, true));
    assert!(!a.collides_with_grid_with_offsets(Xf::IDENTITY, &c, Xf::IDENTITY, false));
    // Any overlap is caught, even a single pixel step.
    assert!(a.collides_with_grid_with_offsets(
        Xf::IDENTITY,
        &c,
        Xf::from_pos(IVec2::new(1, 0)),
        true
    ));
    assert!(a.collides_with_grid_with_offsets(
        Xf::from_pos(IVec2::new(0, -1)),
        &c,
        Xf::IDENTITY,
        false
    ));
}

#[test]
fn test_custom_xf_difference_rotates_other() {
    let a = single(Tile::WallA, IVec2::ZERO);
    // Half a turn around the tile center turns the wedge into its complement.
    let half_turn = Xf::new(IVec2::splat(TILE_SIZE), 2);
    assert!(!a.collides_with_grid_with_custom_xf_difference(&a, half_turn, true));
    assert!(a.collides_with_grid_with_custom_xf_difference(&a, Xf::IDENTITY, true));
}

#[test]
fn test_touching_blocks_do_not_collide() {
    let a = layer_grid(3, 3, vec![1; 9], Xf::IDENTITY);
    let b = layer_grid(3, 3, vec![1; 9], Xf::from_pos(IVec2::new(3 * TILE_SIZE, 5)));
    for full in [true, false] {
        assert!(!a.collides_with_grid_with_offsets(Xf::IDENTITY, &b, Xf::IDENTITY, full));
        assert!(a.collides_with_grid_with_offsets(
            Xf::from_pos(IVec2::new(1, 0)),
            &b,
            Xf::IDENTITY,
            full
        ));
    }
}

#[test]
fn test_remove_tile_restores_neighbour_min_masks() {
    let mut grid = layer_grid(2, 2, vec![1; 4], Xf::IDENTITY);
    assert_eq!(grid.mass(), 8);
    // The shared vertex is interior.
    assert_eq!(grid.hitbox_min()[&IVec2::ZERO], 0b1011);

    grid.remove_tile(IVec2::ONE);
    assert_eq!(grid.mass(), 6);
    assert_eq!(grid.size(), IVec2::new(2, 2));
    assert_eq!(grid.hitbox_min()[&IVec2::ZERO], 0b1111);
    assert!(!grid.hitbox_full().contains_key(&IVec2::ONE));
}

#[test]
fn test_zero_area_edit_changes_nothing() {
    let mut grid = layer_grid(2, 1, vec![1, 2], Xf::from_pos(IVec2::new(7, 3)));
    let before = (
        grid.size(),
        grid.mass(),
        grid.hitbox_full().clone(),
        grid.hitbox_min().clone(),
        grid.grid_to_world(),
    );
    grid.modify_region(IVec2::new(1, 0), IVec2::ZERO, |_| {});
    let after = (
        grid.size(),
        grid.mass(),
        grid.hitbox_full().clone(),
        grid.hitbox_min().clone(),
        grid.grid_to_world(),
    );
    assert_eq!(before, after);
}

#[test]
fn test_growing_edit_keeps_existing_tiles_in_place() {
    let mut grid = single(Tile::Wall, IVec2::new(24, 24));
    grid.modify_region(IVec2::new(-2, -1), IVec2::ONE, |region| {
        assert_eq!(region.size(), IVec2::ONE);
        assert_eq!(region.get(IVec2::ZERO), Tile::Air);
        region.set(IVec2::ZERO, Tile::WallD);
    });
    assert_eq!(grid.size(), IVec2::new(3, 2));
    assert_eq!(grid.tile_at(IVec2::new(2, 1)), Tile::Wall);
    assert_eq!(grid.tile_at(IVec2::ZERO), Tile::WallD);
    assert_eq!(grid.grid_to_world().pos, IVec2::new(0, 12));
    assert!(grid.collides_with_point_in_world_space(IVec2::new(30, 30)));
    assert_eq!(grid.mass(), 3);
}

#[test]
fn test_layer_loads_from_json() {
    let layer: TileLayer =
        serde_json::from_str(r#"{ "width": 2, "height": 1, "data": [1, 3] }"#).unwrap();
    let grid = Grid::from_layer(&layer, Xf::IDENTITY).unwrap();
    assert_eq!(grid.size(), IVec2::new(2, 1));
    assert_eq!(grid.tile_at(IVec2::ZERO), Tile::Wall);
    assert_eq!(grid.tile_at(IVec2::new(1, 0)), Tile::WallB);
    assert_eq!(grid.mass(), 3);
}

/// Grids whose shape contains the world-space high-res cell.
fn claimants(grids: &[&Grid], cell: IVec2) -> usize {
    grids
        .iter()
        .filter(|grid| {
            let local = grid.world_to_grid().transform_high_res_cell(cell);
            grid.collides_with_point_in_grid_space_high_res(local)
        })
        .count()
}

#[test]
fn test_wedge_slides_along_its_complement() {
    let ramp = single(Tile::WallA, IVec2::ZERO);
    for shift in -11..=11 {
        let pos = IVec2::new(-shift, shift);
        let complement = single(Tile::WallC, pos);
        // Half a turn makes the same kind of wedge face the other way.
        let mut turned = single(Tile::WallA, pos);
        turned.set_xf(Xf::new(turned.xf().pos, 2));

        for slider in [&complement, &turned] {
            for y in -36..72 {
                for x in -36..72 {
                    let cell = IVec2::new(x, y);
                    assert!(
                        claimants(&[&ramp, slider], cell) <= 1,
                        "shift {shift}: cell {cell} claimed twice"
                    );
                }
            }
            for full in [true, false] {
                let hit = ramp.collides_with_grid_with_offsets(Xf::IDENTITY, slider, Xf::IDENTITY, full);
                assert!(!hit, "shift {shift}: resting wedges collide");
            }
            if shift.abs() <= 10 {
                assert!(ramp.collides_with_grid_with_offsets(
                    Xf::IDENTITY,
                    slider,
                    Xf::from_pos(IVec2::new(1, 0)),
                    true
                ));
            }
        }
    }
}

#[test]
fn test_side_by_side_wedges_fill_shared_edge_once() {
    let grid = layer_grid(2, 1, vec![Tile::WallA as i32, Tile::WallC as i32], Xf::IDENTITY);
    let s = TILE_SIZE_HIGH_RES;
    for y in 0..s {
        for x in [s - 1, s] {
            let cell = IVec2::new(x, y);
            let claims = collides_with_point_high_res(0, cell) as i32
                + collides_with_point_high_res(2, cell - IVec2::new(s, 0)) as i32;
            assert!(claims <= 1, "cell {cell}");
            assert_eq!(grid.collides_with_point_in_grid_space_high_res(cell), claims == 1);
        }
    }
    // Every boundary pixel on either side is solid, owned by exactly one tile.
    for y in 0..TILE_SIZE {
        assert!(grid.collides_with_point_in_grid_space(IVec2::new(TILE_SIZE - 1, y)));
        assert!(grid.collides_with_point_in_grid_space(IVec2::new(TILE_SIZE, y)));
    }
}

struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: i32) -> i32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 33) % bound as u64) as i32
    }

    fn xf(&mut self, spread: i32) -> Xf {
        let pos = IVec2::new(self.next(2 * spread + 1), self.next(2 * spread + 1)) - spread;
        Xf::new(pos, self.next(4))
    }

    fn grid(&mut self) -> Grid {
        let (width, height) = (1 + self.next(2), 1 + self.next(2));
        let data = (0..width * height).map(|_| self.next(6)).collect();
        layer_grid(width, height, data, self.xf(12))
    }
}

#[test]
fn test_collision_is_symmetric() {
    let mut rng = Lcg(11);
    for _ in 0..2000 {
        let (a, b) = (rng.grid(), rng.grid());
        let (offset_a, offset_b) = (rng.xf(6), rng.xf(6));
        for full in [true, false] {
            assert_eq!(
                a.collides_with_grid_with_offsets(offset_a, &b, offset_b, full),
                b.collides_with_grid_with_offsets(offset_b, &a, offset_a, full),
                "a {:?} at {offset_a:?}, b {:?} at {offset_b:?}",
                a.cells(),
                b.cells()
            );
        }
    }
}
