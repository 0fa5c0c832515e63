use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tf_project::FlowsheetPayload;
use tf_results::{round_sig, CompoundInfo, CompoundSearchResult, SimulationResult, StreamResult, UnitResult};
use tf_thermo::{build_engine, FlashEngine, Phase, StreamState};

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error("project error: {0}")]
    Project(#[from] tf_project::ProjectError),
    #[error("thermo error: {0}")]
    Thermo(#[from] tf_thermo::ThermoError),
    #[error("solver error: {0}")]
    Solver(#[from] tf_solver::SolverError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "tf-cli")]
#[command(about = "ThermoFlow CLI - steady-state flowsheet simulation tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a flowsheet payload file (JSON or YAML)
    Validate {
        /// Path to the flowsheet payload file
        payload_path: PathBuf,
    },
    /// Solve a flowsheet payload and print the simulation result
    Run {
        /// Path to the flowsheet payload file
        payload_path: PathBuf,
        /// Write the result JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Maximum solver iterations
        #[arg(long, default_value_t = 100)]
        max_iterations: usize,
        /// Tear-stream convergence tolerance
        #[arg(long, default_value_t = 1e-6)]
        tolerance: f64,
    },
    /// List the built-in compound database, optionally filtered by name
    Compounds {
        /// Case-insensitive substring filter
        #[arg(short, long)]
        filter: Option<String>,
    },
}

fn load_payload(path: &Path) -> CliResult<FlowsheetPayload> {
    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    Ok(if is_json { tf_project::load_json(path)? } else { tf_project::load_yaml(path)? })
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Validate { payload_path } => cmd_validate(&payload_path),
        Commands::Run { payload_path, output, max_iterations, tolerance } => {
            cmd_run(&payload_path, output.as_deref(), max_iterations, tolerance)
        }
        Commands::Compounds { filter } => cmd_compounds(filter.as_deref()),
    }
}

fn cmd_validate(payload_path: &Path) -> CliResult<()> {
    println!("Validating flowsheet: {}", payload_path.display());
    let payload = load_payload(payload_path)?;
    println!(
        "Flowsheet is valid: {} units, {} streams",
        payload.units.len(),
        payload.streams.len()
    );
    Ok(())
}

fn cmd_run(payload_path: &Path, output: Option<&Path>, max_iterations: usize, tolerance: f64) -> CliResult<()> {
    let payload = load_payload(payload_path)?;
    let engine = build_engine(&payload.thermo.package, &payload.thermo.components)?;

    let (mut flowsheet, mut warnings) = tf_solver::flowsheet_from_payload(&payload, &engine)?;
    let config = tf_solver::SolveConfig { max_iterations, tolerance };
    let report = tf_solver::solve(&mut flowsheet, &engine, &config)?;
    warnings.extend(report.warnings.clone());

    let result = build_simulation_result(&payload, &flowsheet, &engine, &report, warnings);

    let json = serde_json::to_string_pretty(&result)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)?;
            println!("Wrote result to {}", path.display());
        }
        None => println!("{json}"),
    }

    if result.converged {
        println!("Converged in {} iteration(s)", result.iterations);
    } else {
        println!("Did not converge after {} iteration(s)", result.iterations);
    }
    Ok(())
}

fn build_simulation_result(
    payload: &FlowsheetPayload,
    flowsheet: &tf_solver::Flowsheet,
    engine: &FlashEngine,
    report: &tf_solver::SolveReport,
    warnings: Vec<String>,
) -> SimulationResult {
    let streams: Vec<StreamResult> = flowsheet
        .streams
        .iter()
        .map(|(id, state)| stream_result(id, state))
        .collect();

    let units: Vec<UnitResult> = flowsheet
        .units
        .values()
        .map(|unit| {
            let (inlet_streams, outlet_streams): (Vec<String>, Vec<String>) = flowsheet
                .connections
                .iter()
                .fold((Vec::new(), Vec::new()), |(mut ins, mut outs), c| {
                    if c.to_unit.as_deref() == Some(unit.id.as_str()) {
                        ins.push(c.stream_id.clone());
                    }
                    if c.from_unit.as_deref() == Some(unit.id.as_str()) {
                        outs.push(c.stream_id.clone());
                    }
                    (ins, outs)
                });
            UnitResult {
                id: unit.id.clone(),
                duty_kw: Some(round_sig(unit.duty_w / 1000.0, 6)),
                status: if unit.warnings.is_empty() { "ok".to_string() } else { "warning".to_string() },
                extra: unit.extra.iter().map(|(k, v)| (k.clone(), serde_json::json!(round_sig(*v, 6)))).collect(),
                pressure_drop_kpa: Some(round_sig(unit.pressure_drop_pa / 1000.0, 6)),
                efficiency: unit.efficiency,
                inlet_streams: Some(inlet_streams),
                outlet_streams: Some(outlet_streams),
            }
        })
        .collect();

    SimulationResult {
        flowsheet_name: payload.name.clone(),
        status: if report.converged { "converged".to_string() } else { "not-converged".to_string() },
        streams,
        units,
        warnings,
        diagnostics: BTreeMap::new(),
        converged: report.converged,
        iterations: report.iterations as u32,
        mass_balance_error: report.mass_balance_error.map(|e| round_sig(e, 6)),
        energy_balance_error: report.energy_balance_error.map(|e| round_sig(e, 6)),
        property_package: Some(payload.thermo.package.clone()),
        components: Some(engine.component_names.as_ref().clone()),
    }
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Vapor => "vapor",
        Phase::Liquid => "liquid",
        Phase::TwoPhase => "two-phase",
        Phase::LiquidLiquidVapor => "three-phase",
    }
}

fn composition_map(names: &[String], fracs: &[f64]) -> BTreeMap<String, f64> {
    names.iter().zip(fracs.iter()).map(|(n, z)| (n.clone(), round_sig(*z, 6))).collect()
}

fn mass_composition_map(names: &[String], mws: &[f64], zs: &[f64]) -> BTreeMap<String, f64> {
    let masses: Vec<f64> = zs.iter().zip(mws.iter()).map(|(z, mw)| z * mw).collect();
    let total: f64 = masses.iter().sum();
    if total <= 0.0 {
        return BTreeMap::new();
    }
    names.iter().zip(masses.iter()).map(|(n, m)| (n.clone(), round_sig(m / total, 6))).collect()
}

fn stream_result(id: &str, state: &StreamState) -> StreamResult {
    let mw = state.molecular_weight;
    let per_mass = |x: f64| if mw > 0.0 { Some(round_sig(x / mw, 6)) } else { None };

    StreamResult {
        id: id.to_string(),
        temperature_c: Some(round_sig(state.t_k - 273.15, 6)),
        pressure_kpa: Some(round_sig(state.p_pa / 1000.0, 6)),
        mass_flow_kg_per_h: Some(round_sig(state.mass_flow_kg_s * 3600.0, 6)),
        mole_flow_kmol_per_h: Some(round_sig(state.molar_flow_mol_s * 3600.0 / 1000.0, 6)),
        vapor_fraction: Some(round_sig(state.vapor_fraction, 6)),
        liquid_fraction: Some(round_sig(state.liquid_fraction, 6)),
        composition: composition_map(&state.component_names, &state.zs),
        mass_composition: Some(mass_composition_map(&state.component_names, &state.component_mw, &state.zs)),
        enthalpy_kj_per_kg: per_mass(state.enthalpy_j_mol),
        entropy_kj_per_kg_k: per_mass(state.entropy_j_mol_k),
        viscosity_cp: state.viscosity_pa_s.map(|v| round_sig(v * 1000.0, 6)),
        molecular_weight: Some(round_sig(mw, 6)),
        heat_capacity_kj_per_kg_k: state.cp_j_mol_k.and_then(|cp| if mw > 0.0 { Some(round_sig(cp / mw, 6)) } else { None }),
        thermal_conductivity_w_per_mk: state.thermal_conductivity_w_m_k.map(|k| round_sig(k, 6)),
        heat_capacity_cv_kj_per_kg_k: state.cv_j_mol_k.and_then(|cv| if mw > 0.0 { Some(round_sig(cv / mw, 6)) } else { None }),
        compressibility_factor: state.compressibility_factor.map(|z| round_sig(z, 6)),
        speed_of_sound_m_per_s: state.speed_of_sound_m_s.map(|v| round_sig(v, 6)),
        surface_tension_n_per_m: state.surface_tension_n_m.map(|v| round_sig(v, 6)),
        joule_thomson_k_per_kpa: state.joule_thomson_k_per_pa.map(|v| round_sig(v * 1000.0, 6)),
        isentropic_exponent: state.isentropic_exponent.map(|v| round_sig(v, 6)),
        gibbs_energy_kj_per_kg: state.gibbs_j_mol.and_then(|g| if mw > 0.0 { Some(round_sig(g / mw, 6)) } else { None }),
        phase: Some(phase_label(state.phase).to_string()),
        liquid_composition: state.xs.as_ref().map(|xs| composition_map(&state.component_names, xs)),
        vapor_composition: state.ys.as_ref().map(|ys| composition_map(&state.component_names, ys)),
    }
}

fn cmd_compounds(filter: Option<&str>) -> CliResult<()> {
    let filter_lower = filter.map(str::to_lowercase);
    let compounds: Vec<CompoundInfo> = tf_thermo::builtin_registry()
        .into_iter()
        .filter(|c| filter_lower.as_ref().map(|f| c.name.to_lowercase().contains(f.as_str())).unwrap_or(true))
        .map(|c| {
            let formula = c.formula.iter().map(|(el, n)| format!("{el}{n}")).collect::<Vec<_>>().join("");
            CompoundInfo {
                name: c.name.clone(),
                cas: c.cas.clone(),
                formula: Some(formula),
                molecular_weight: Some(c.mw),
                boiling_point_c: Some(round_sig(c.tb - 273.15, 6)),
                critical_temperature_c: Some(round_sig(c.tc - 273.15, 6)),
                critical_pressure_kpa: Some(round_sig(c.pc / 1000.0, 6)),
            }
        })
        .collect();

    let result = CompoundSearchResult { compounds };
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
