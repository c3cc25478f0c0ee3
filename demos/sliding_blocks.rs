use tilegrid::*;

fn main() {
    let mut manager = GridManager::new();

    // 0 = air, 1 = square, 2..=5 = wedges.
    let ramp = TileLayer::new(
        6,
        2,
        vec![
            0, 0, 0, 0, 4, 1, //
            1, 1, 1, 4, 1, 1,
        ],
    );
    let floor = match Grid::from_layer(&ramp, Xf::from_pos(IVec2::new(0, 60))) {
        Ok(grid) => grid,
        Err(err) => {
            eprintln!("Bad tile layer: {err}");
            return;
        }
    };
    manager.add_grid(GridObject::new(floor).with_infinite_mass(true));

    let block = Grid::from_layer(&TileLayer::new(1, 1, vec![1]), Xf::from_pos(IVec2::new(0, 40)))
        .expect("single tile layer is valid");
    let block_id = manager.add_grid(GridObject::new(block).with_velocity(Vec2::new(1.5, 1.0)));

    for tick in 0..40 {
        manager.tick_physics();
        let object = manager.grid(block_id);
        if tick % 5 == 0 {
            println!(
                "tick {tick:2}: position {} velocity {:?} owed {}",
                object.grid.grid_to_world().pos,
                object.vel,
                object.vel_owed
            );
        }
    }
}
