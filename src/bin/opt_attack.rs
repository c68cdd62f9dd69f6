//! Runs untargeted and targeted attacks against a randomly initialised network.
//!
//! Usage: `opt-attack [config.json] [network.json]`
//!
//! `network.json` holds a serialized `ArgmaxClassifier`; without it a random
//! network is built. The log level is read from `OPT_ATTACK_LOG` (default `info`).
use log::{info, warn, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::Normal;
use ndarray_rand::RandomExt;
use opt_attack::classifier::{Affine2, ArgmaxClassifier, Sequential};
use opt_attack::initial::LabelledSamples;
use opt_attack::{attack_targeted, attack_untargeted, AttackConfig, AttackOutcome, Oracle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::error::Error;

const INPUT_DIM: usize = 8;
const HIDDEN: usize = 32;
const NUM_CLASSES: usize = 4;
const NUM_REFERENCES: usize = 500;
const NUM_ATTACKS: usize = 5;

fn init_logging() -> Result<(), Box<dyn Error>> {
    let level = match std::env::var("OPT_ATTACK_LOG") {
        Ok(level) => level.parse::<LevelFilter>()?,
        Err(_) => LevelFilter::Info,
    };
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S)} {l} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))?;
    log4rs::init_config(config)?;
    Ok(())
}

fn load_classifier(path: &str) -> Result<ArgmaxClassifier, Box<dyn Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn random_classifier(rng: &mut StdRng) -> Result<ArgmaxClassifier, Box<dyn Error>> {
    let dist = Normal::new(0., 1.)?;
    let mut net = Sequential::default();
    net.add_dense(Affine2::new(
        Array2::random_using((HIDDEN, INPUT_DIM), dist, rng),
        Array1::random_using(HIDDEN, dist, rng),
    ));
    net.add_relu(HIDDEN);
    net.add_dense(Affine2::new(
        Array2::random_using((NUM_CLASSES, HIDDEN), dist, rng),
        Array1::random_using(NUM_CLASSES, dist, rng),
    ));
    Ok(ArgmaxClassifier::new(net))
}

fn report(kind: &str, outcome: &AttackOutcome<usize>, distortions: &mut Vec<f64>) {
    match outcome {
        AttackOutcome::AlreadyMisclassified { label, .. } => {
            info!("{}: input already labelled {}", kind, label);
        }
        AttackOutcome::Adversarial(example) => {
            info!(
                "{}: distortion {:.4} label {:?} queries {} ({:?})",
                kind,
                example.distortion,
                example.label,
                example.total_queries(),
                example.termination
            );
            distortions.push(example.distortion);
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging()?;
    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => AttackConfig::from_path(path)?,
        None => AttackConfig::default(),
    };
    info!("Config: {:?}", config);

    let mut rng = StdRng::seed_from_u64(0);
    let classifier = match args.get(2) {
        Some(path) => load_classifier(path)?,
        None => random_classifier(&mut rng)?,
    };
    info!("Network: {}", classifier.network());
    let input_dim = classifier.network().input_dim().ok_or("network has no layers")?;
    let num_classes = classifier.network().output_dim().ok_or("network has no layers")?;

    let dist = Normal::new(0., 1.)?;
    let inputs = Array2::random_using((NUM_REFERENCES, input_dim), dist, &mut rng);
    let labels = classifier.predict_rows(inputs.view());
    let references = LabelledSamples::new(inputs, labels);

    let mut untargeted = Vec::new();
    let mut targeted = Vec::new();
    for idx in 0..NUM_ATTACKS {
        let x0 = Array1::random_using(input_dim, dist, &mut rng);
        let y0 = classifier.predict(x0.view());
        info!("Attack {}: original label {}", idx, y0);

        match attack_untargeted(&classifier, &references, x0.view(), &y0, &config, &mut rng) {
            Ok(outcome) => report("untargeted", &outcome, &mut untargeted),
            Err(e) => warn!("untargeted: {}", e),
        }

        let target = (y0 + 1) % num_classes;
        match attack_targeted(
            &classifier,
            &references,
            x0.view(),
            &y0,
            target,
            &config,
            &mut rng,
        ) {
            Ok(outcome) => report(&format!("targeted {}", target), &outcome, &mut targeted),
            Err(e) => warn!("targeted {}: {}", target, e),
        }
    }

    println!(
        "Average distortion: untargeted {:.4} ({} found), targeted {:.4} ({} found)",
        mean(&untargeted),
        untargeted.len(),
        mean(&targeted),
        targeted.len()
    );
    Ok(())
}
