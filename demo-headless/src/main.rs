use canopy_thermal_core::canopy::ElementStore;
use canopy_thermal_core::core_types::element::{
    Attribute, Element, ElementId, LeafAttributes, LeafDefaults, ViewFactors,
};
use canopy_thermal_core::core_types::meteo::MeteoForcing;
use canopy_thermal_core::core_types::units::{Celsius, KiloPascals, MetersPerSecond, Percent};
use canopy_thermal_core::solver::{
    CanopyThermalSolver, LongwaveModel, SoilModel, SolverConfig, SolverMode, StallRule,
};
use canopy_thermal_core::ThermalError;
use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::f64::consts::PI;
use tracing::info;
use tracing_subscriber::EnvFilter;

const SOIL_ID: ElementId = 0;

/// Peak clear-sky PPFD at solar noon (µmol m⁻² s⁻¹)
const PEAK_PPFD: f64 = 2000.0;

/// Peak transpiration of a fully sunlit leaf (mol m⁻² s⁻¹)
const PEAK_TRANSPIRATION: f64 = 0.004;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SoilArg {
    EnergyBalance,
    Forced,
    Prescribed,
}

impl From<SoilArg> for SoilModel {
    fn from(arg: SoilArg) -> Self {
        match arg {
            SoilArg::EnergyBalance => SoilModel::EnergyBalance,
            SoilArg::Forced => SoilModel::Forced,
            SoilArg::Prescribed => SoilModel::Prescribed,
        }
    }
}

/// Diurnal canopy temperature demo on a synthetic canopy
#[derive(Parser, Debug)]
#[command(name = "canopy-thermal-demo")]
#[command(about = "Leaf and soil temperatures over one day", long_about = None)]
struct Args {
    /// Number of leaves in the synthetic canopy
    #[arg(short, long, default_value_t = 200)]
    leaves: u32,

    /// Seed of the canopy generator
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Wind speed above the canopy in m/s
    #[arg(short, long, default_value_t = 1.5)]
    wind: f64,

    /// Relative humidity in %
    #[arg(long, default_value_t = 60.0)]
    humidity: f64,

    /// Daily minimum air temperature in °C (reached at 03:00)
    #[arg(long, default_value_t = 16.0)]
    t_min: f64,

    /// Daily maximum air temperature in °C (reached at 15:00)
    #[arg(long, default_value_t = 32.0)]
    t_max: f64,

    /// Solve all leaves as one Newton system (pairwise long-wave exchange)
    #[arg(long)]
    simultaneous: bool,

    /// Use pairwise view factors instead of the lumped k_leaves term
    #[arg(long)]
    pairwise: bool,

    /// Halve the relaxation step only when a sweep fails to shrink the error
    #[arg(long)]
    relaxed_stall: bool,

    /// Source of the soil surface temperature
    #[arg(long, value_enum, default_value_t = SoilArg::EnergyBalance)]
    soil: SoilArg,

    /// Solve leaves on a single thread
    #[arg(long)]
    serial: bool,
}

/// Per-leaf fraction of the incoming light, fixed for the day
struct Canopy {
    store: ElementStore,
    light_fraction: BTreeMap<ElementId, f64>,
    /// Fraction of the above-canopy wind reaching each leaf
    shelter: BTreeMap<ElementId, f64>,
}

fn build_canopy(args: &Args) -> Result<Canopy, ThermalError> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let leaves: Vec<_> = (1..=args.leaves)
        .map(|id| {
            let attributes = LeafAttributes {
                length: Some(rng.random_range(4.0..14.0)),
                ..LeafAttributes::default()
            };
            Element::leaf(id, format!("L{id}"), attributes)
        })
        .collect();
    let mut store: ElementStore = std::iter::once(Element::soil(SOIL_ID, "other"))
        .chain(leaves)
        .collect();
    store.initialize(&LeafDefaults::default());

    let mut light_fraction = BTreeMap::new();
    let mut shelter = BTreeMap::new();
    for id in 1..=args.leaves {
        shelter.insert(id, rng.random_range(0.2..1.0));
        // Deeper leaves see less sky and less light
        let depth: f64 = rng.random_range(0.0..1.0);
        light_fraction.insert(id, (1.0 - 0.9 * depth) * rng.random_range(0.7..1.0));
        store.set_view_factors(
            id,
            ViewFactors::new(0.9 - 0.6 * depth, rng.random_range(0.2..0.5)),
        )?;

        let mut vis_a_vis = BTreeMap::new();
        for _ in 0..5 {
            let other = rng.random_range(1..=args.leaves);
            if other != id {
                vis_a_vis.insert(other, -rng.random_range(0.01..0.06));
            }
        }
        vis_a_vis.insert(SOIL_ID, -rng.random_range(0.05..0.15));
        store.leaf_mut(id)?.vis_a_vis = Some(vis_a_vis);
    }

    Ok(Canopy {
        store,
        light_fraction,
        shelter,
    })
}

fn air_temperature(args: &Args, hour: u8) -> Celsius {
    let mean = 0.5 * (args.t_max + args.t_min);
    let amplitude = 0.5 * (args.t_max - args.t_min);
    Celsius::new(mean + amplitude * (2.0 * PI * (f64::from(hour) - 9.0) / 24.0).sin())
}

fn incoming_ppfd(hour: u8) -> f64 {
    let angle = PI * (f64::from(hour) - 6.0) / 12.0;
    PEAK_PPFD * angle.sin().max(0.0)
}

fn main() -> Result<(), ThermalError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let config = SolverConfig {
        mode: if args.simultaneous {
            SolverMode::Simultaneous
        } else {
            SolverMode::Sequential
        },
        longwave: if args.pairwise {
            LongwaveModel::Pairwise
        } else {
            LongwaveModel::Lumped
        },
        stall_rule: if args.relaxed_stall {
            StallRule::NoProgress
        } else {
            StallRule::AbsoluteDifference
        },
        soil_model: args.soil.into(),
        parallel: !args.serial,
        ..SolverConfig::default()
    };
    info!(?config, leaves = args.leaves, seed = args.seed, "building canopy");

    let Canopy {
        mut store,
        light_fraction,
        shelter,
    } = build_canopy(&args)?;
    let solver = CanopyThermalSolver::new(config);

    println!("=== Canopy Thermal Demo ===\n");
    println!(
        "{} leaves, wind {:.1} m/s, humidity {:.0}%, mode {:?}, long-wave {:?}, soil {:?}\n",
        args.leaves, args.wind, args.humidity, config.mode, config.longwave, config.soil_model
    );
    println!(
        "{:>4} {:>7} {:>7} {:>7} {:>7} {:>7} {:>7} {:>5}  status",
        "hour", "T_air", "PPFD", "T_mean", "T_min", "T_max", "T_soil", "iter"
    );

    let mut t_soil_prior = air_temperature(&args, 0);
    for hour in 0..24u8 {
        let t_air = air_temperature(&args, hour);
        let ppfd = incoming_ppfd(hour);
        for (&id, fraction) in &light_fraction {
            let ei = ppfd * fraction;
            store.set_irradiance(id, ei)?;
            store.leaf_mut(id)?.e = Some(PEAK_TRANSPIRATION * ei / PEAK_PPFD);
        }
        store.set_irradiance(SOIL_ID, 0.3 * ppfd)?;

        let forcing = MeteoForcing::new(
            t_air,
            KiloPascals::STANDARD_ATMOSPHERE,
            Percent::new(args.humidity),
        )
        .with_wind(MetersPerSecond::new(args.wind))
        .with_soil_temperature(t_soil_prior)
        .with_hour(hour);
        for (&id, fraction) in &shelter {
            store.leaf_mut(id)?.u = Some(*forcing.u * fraction);
        }

        let outcome = solver.step(&mut store, &forcing)?;
        t_soil_prior = outcome.t_soil;

        let temps = store.column(Attribute::Tlc);
        let mean = temps.values().sum::<f64>() / temps.len().max(1) as f64;
        let min = temps.values().copied().fold(f64::INFINITY, f64::min);
        let max = temps.values().copied().fold(f64::NEG_INFINITY, f64::max);
        println!(
            "{:>4} {:>7.2} {:>7.0} {:>7.2} {:>7.2} {:>7.2} {:>7.2} {:>5}  {:?}",
            hour,
            t_air.value(),
            ppfd,
            mean,
            min,
            max,
            outcome.t_soil.value(),
            outcome.report.iterations,
            outcome.report.status
        );
    }

    Ok(())
}
