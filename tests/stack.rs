extern crate stencil;
use stencil::{Engine, Value};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PROBE: &str = "{{key}}{{value}}{{parent.key}}";

// RUST_LOG=debug surfaces the engine's degradation diagnostics
fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sample_data() -> Value {
    serde_json::from_str::<Value>(
        r#"{
            "title": "T",
            "flag": true,
            "items": {
                "a": {"sub": "1"},
                "b": {"sub": "2"}
            }
        }"#,
    )
    .expect("valid sample data")
}

// random mix of text, placeholders, nested loops and conditionals,
// including stray closers that must stay literal
fn build_template(rng: &mut StdRng, depth: usize, out: &mut String) {
    let pieces = rng.random_range(2..5);
    for _ in 0..pieces {
        match rng.random_range(0..9) {
            0 => out.push_str("text "),
            1 => out.push_str("{{key}}"),
            2 => out.push_str("{{value}}"),
            3 => out.push_str("{{value.sub}}"),
            4 => out.push_str("{{parent.key}}"),
            5 => out.push_str("{{title}}"),
            6 if depth < 3 => {
                out.push_str("{% foreach items %}");
                build_template(rng, depth + 1, out);
                out.push_str("{% endforeach %}");
            }
            7 if depth < 3 => {
                out.push_str("{% if flag %}");
                build_template(rng, depth + 1, out);
                out.push_str("{% else %}");
                build_template(rng, depth + 1, out);
                out.push_str("{% endif %}");
            }
            8 => out.push_str("{% endforeach %}"),
            _ => out.push('.'),
        }
    }
}

#[test]
fn random_nesting_leaves_no_loop_state_behind() {
    init_logs();
    let engine = Engine::new();
    for seed in 0..64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut text = String::new();
        build_template(&mut rng, 0, &mut text);

        let first = engine.render(&text, sample_data()).expect("mapping data");
        let second = engine.render(&text, sample_data()).expect("mapping data");
        assert_eq!(first, second, "seed {} template {:?}", seed, text);

        // an unrelated follow-up render must see an empty loop stack:
        // loop-relative names stay unresolved outside any loop
        let probe = engine.render(PROBE, sample_data()).expect("mapping data");
        assert_eq!(probe, PROBE, "seed {} template {:?}", seed, text);
    }
}

#[test]
fn rendering_is_deterministic_across_engines() {
    init_logs();
    let mut rng = StdRng::seed_from_u64(7);
    let mut text = String::new();
    build_template(&mut rng, 0, &mut text);

    let one = Engine::new().render(&text, sample_data()).expect("mapping data");
    let two = Engine::new().render(&text, sample_data()).expect("mapping data");
    assert_eq!(one, two, "template {:?}", text);
}
