// ABOUTME: String-rewriting L-system + turtle interpreter used to shape river and ridge polylines
// ABOUTME: Shared helper for FractalContinentGenerator's river-template and ridge-template steps

/// Expand axiom `F` with `rule` applied `iterations` times. Only `F`, `+`,
/// `-`, `[`, `]` are meaningful symbols; anything else in `rule` is copied
/// through literally.
pub fn expand(rule: &str, iterations: u32) -> String {
    let mut current = String::from("F");
    for _ in 0..iterations {
        let mut next = String::with_capacity(current.len() * 2);
        for ch in current.chars() {
            if ch == 'F' {
                next.push_str(rule);
            } else {
                next.push(ch);
            }
        }
        current = next;
    }
    current
}

/// Turtle-graphics interpretation of an expanded L-system string into a
/// polyline of world-space points, starting at `origin` heading towards
/// `initial_heading_rad`, advancing `step` meters per `F` and turning
/// `angle_rad` per `+`/`-`. `[`/`]` push/pop the turtle state (position +
/// heading) for branch points.
pub fn interpret(program: &str, origin: (f32, f32), initial_heading_rad: f32, step: f32, angle_rad: f32) -> Vec<(f32, f32)> {
    let mut pos = origin;
    let mut heading = initial_heading_rad;
    let mut path = vec![pos];
    let mut stack: Vec<((f32, f32), f32)> = Vec::new();

    for ch in program.chars() {
        match ch {
            'F' => {
                pos = (pos.0 + heading.cos() * step, pos.1 + heading.sin() * step);
                path.push(pos);
            }
            '+' => heading += angle_rad,
            '-' => heading -= angle_rad,
            '[' => stack.push((pos, heading)),
            ']' => {
                if let Some((p, h)) = stack.pop() {
                    pos = p;
                    heading = h;
                }
            }
            _ => {}
        }
    }
    path
}

/// Scale `step` so that the *main-stem* length (the "F"-only forward
/// distance, ignoring branches) of the expanded program matches
/// `target_length` as closely as possible - used so river stems reach
/// from their source to the coast (§4.C step 6).
pub fn step_size_for_target_length(program: &str, target_length: f32) -> f32 {
    let forward_count = program.chars().filter(|&c| c == 'F').count().max(1);
    target_length / forward_count as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_grows_with_iterations() {
        let gen1 = expand("F[+F]F[-F]F", 1);
        let gen2 = expand("F[+F]F[-F]F", 2);
        assert!(gen2.len() > gen1.len());
        assert_eq!(gen1, "F[+F]F[-F]F");
    }

    #[test]
    fn interpretation_returns_path_from_origin() {
        let program = expand("F[+F]F[-F]F", 1);
        let path = interpret(&program, (0.0, 0.0), 0.0, 10.0, 0.5);
        assert_eq!(path[0], (0.0, 0.0));
        assert!(path.len() > 1);
    }

    #[test]
    fn step_size_matches_target_length_for_pure_forward_program() {
        let program = "FFFF";
        let step = step_size_for_target_length(program, 400.0);
        assert!((step - 100.0).abs() < 1e-5);
    }
}
