use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

use anyhow::Context;
use atomic_core::{
    basis::{GaussianBasisSet, Representation},
    config::{ConfigBasisSet, ConfigFieldParams},
    field::{FieldGrid, FieldParams},
    interpolate::{interpolate, interpolate_j2, AxisOrder, Kind, Method, Options, Samples},
    orbital::MoMatrix,
    universe::Universe,
    xyz::read_xyz,
};
use clap::{ArgAction, Parser, Subcommand};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: AtomicCommand,

    /// Indent the JSON written to stdout
    #[arg(long, short, action = ArgAction::SetTrue)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum AtomicCommand {
    /// Summarize the frames of an xyz trajectory
    Xyz {
        path: PathBuf,

        /// Unit of the coordinates if the file does not name one
        #[arg(long, short, default_value = "A")]
        unit: String,
    },

    /// Evaluate the basis functions of one frame on a grid and integrate them
    Field {
        basis_set: PathBuf,
        xyz: PathBuf,

        /// Grid parameters as JSON; a 41 point cube from -8 to 8 otherwise
        #[arg(long)]
        params: Option<PathBuf>,

        #[arg(long, short, default_value_t = 0)]
        frame: usize,

        #[arg(long, short, default_value = "A")]
        unit: String,

        /// Use cartesian instead of spherical components
        #[arg(long, action = ArgAction::SetTrue)]
        cartesian: bool,

        /// Decimal places kept in the generated expressions
        #[arg(long, default_value_t = 8)]
        precision: usize,

        /// Write the evaluated fields here as JSON
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Evaluate molecular orbitals from their basis function coefficients
    Orbitals {
        basis_set: PathBuf,
        xyz: PathBuf,

        /// Orbital coefficients as JSON columns chi, orbital, coefficient, frame
        momatrix: PathBuf,

        /// Grid parameters as JSON; a 41 point cube from -8 to 8 otherwise
        #[arg(long)]
        params: Option<PathBuf>,

        #[arg(long, short, default_value_t = 0)]
        frame: usize,

        #[arg(long, short, default_value = "A")]
        unit: String,

        /// Orbitals to evaluate, 0-based; all of them otherwise
        #[arg(long, num_args = 1..)]
        vector: Option<Vec<usize>>,

        #[arg(long, default_value_t = 8)]
        precision: usize,

        /// Also list the basis functions contributing more than this to each orbital
        #[arg(long)]
        contributions: Option<f64>,

        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Resample scattered samples onto a regular grid
    Interpolate {
        /// Whitespace separated columns with a header line
        path: PathBuf,

        /// Names of the x, y and z columns
        #[arg(long, num_args = 3, default_values = ["x", "y", "z"])]
        columns: Vec<String>,

        /// Interpolate the alpha, gamma and j2 columns
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "columns")]
        j2: bool,

        #[arg(long, short, default_value = "interp2d")]
        method: Method,

        #[arg(long, short, default_value = "cubic")]
        kind: Kind,

        /// Run one dimensional schemes along y before x
        #[arg(long, action = ArgAction::SetTrue)]
        y_first: bool,

        /// Points per axis of the output grid
        #[arg(long, short, default_value_t = 21)]
        dim: usize,

        /// Also trace the smoothed minimum of every column
        #[arg(long, action = ArgAction::SetTrue)]
        minimum: bool,
    },
}

#[derive(Serialize)]
struct FrameSummary {
    frame: usize,
    atoms: usize,
    formula: String,
}

#[derive(Serialize)]
struct FieldSummary {
    label: String,
    norm: f64,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args: Args = Args::parse();

    match args.command {
        AtomicCommand::Xyz { path, unit } => {
            let universe = Universe::from(
                read_xyz(&path, &unit).with_context(|| format!("reading {}", path.display()))?,
            );

            let frames = (0..universe.frames.len())
                .map(|frame| FrameSummary {
                    frame,
                    atoms: universe.frames.atom_count[frame],
                    formula: universe.formula(frame),
                })
                .collect::<Vec<_>>();

            let mut summary = BTreeMap::new();
            summary.insert("frames", serde_json::to_value(frames)?);
            summary.insert("comments", serde_json::to_value(&universe.comments)?);
            write_json(&summary, args.pretty)?;
        }
        AtomicCommand::Field {
            basis_set,
            xyz,
            params,
            frame,
            unit,
            cartesian,
            precision,
            output,
        } => {
            let universe = load_universe(&basis_set, &xyz, &unit)?;
            let params = load_params(params.as_ref())?;
            log::info!("{} frame {frame}: {}", xyz.display(), universe.formula(frame));

            let representation = if cartesian {
                Representation::Cartesian
            } else {
                Representation::Spherical
            };
            let mut fields =
                universe.basis_function_fields(frame, &params, representation, precision)?;

            let summary = fields
                .integrate()
                .into_iter()
                .enumerate()
                .map(|(i, norm)| FieldSummary {
                    label: format!("{}{i}", params.label),
                    norm,
                })
                .collect::<Vec<_>>();
            log::info!("integrated {} fields", summary.len());

            write_fields(output, &fields)?;
            write_json(&summary, args.pretty)?;
        }
        AtomicCommand::Orbitals {
            basis_set,
            xyz,
            momatrix,
            params,
            frame,
            unit,
            vector,
            precision,
            contributions,
            output,
        } => {
            let coefficients: MoMatrix = serde_json::from_reader(BufReader::new(
                File::open(&momatrix).with_context(|| format!("opening {}", momatrix.display()))?,
            ))?;
            let mut universe = load_universe(&basis_set, &xyz, &unit)?.with_momatrix(coefficients);
            let params = load_params(params.as_ref())?;

            let dims = universe.basis_dims(frame)?;
            log::info!(
                "{} frame {frame}: {}, {} spherical functions from {} primitives",
                xyz.display(),
                universe.formula(frame),
                dims.ncs,
                dims.nps
            );

            universe.add_molecular_orbitals(&params, vector.as_deref(), frame, precision, true)?;
            let Some(fields) = universe.fields.as_mut() else {
                anyhow::bail!("no orbitals were evaluated");
            };

            let norms = fields.integrate();
            let mut summary = Vec::with_capacity(norms.len());
            for (i, norm) in norms.into_iter().enumerate() {
                summary.push(FieldSummary {
                    label: fields.geometry(i)?.label.clone(),
                    norm,
                });
            }

            let mut report = BTreeMap::new();
            report.insert("dims", serde_json::to_value(dims)?);
            report.insert("orbitals", serde_json::to_value(&summary)?);
            if let Some(tol) = contributions {
                let orbitals = match &vector {
                    Some(vector) => vector.clone(),
                    None => (0..summary.len()).collect(),
                };
                let mut joined = BTreeMap::new();
                for orbital in orbitals {
                    joined.insert(
                        orbital,
                        universe.basis_function_contributions(orbital, tol, frame)?,
                    );
                }
                report.insert("contributions", serde_json::to_value(joined)?);
            }

            if let Some(fields) = &universe.fields {
                write_fields(output, fields)?;
            }
            write_json(&report, args.pretty)?;
        }
        AtomicCommand::Interpolate {
            path,
            columns,
            j2,
            method,
            kind,
            y_first,
            dim,
            minimum,
        } => {
            let samples = Samples::parse(BufReader::new(File::open(&path)?))
                .with_context(|| format!("reading {}", path.display()))?;
            let options = Options {
                method,
                kind,
                order: if y_first {
                    AxisOrder::YFirst
                } else {
                    AxisOrder::XFirst
                },
                dim,
                minimum,
            };

            if j2 {
                write_json(&interpolate_j2(&samples, &options)?, args.pretty)?;
            } else {
                let columns = [columns[0].as_str(), columns[1].as_str(), columns[2].as_str()];
                write_json(&interpolate(&samples, columns, &options)?, args.pretty)?;
            }
        }
    }

    Ok(())
}

fn load_universe(basis_set: &Path, xyz: &Path, unit: &str) -> anyhow::Result<Universe> {
    let config: ConfigBasisSet = serde_json::from_reader(BufReader::new(
        File::open(basis_set).with_context(|| format!("opening {}", basis_set.display()))?,
    ))?;
    let basis_set = GaussianBasisSet::try_from(config)?;

    let xyz = read_xyz(xyz, unit).with_context(|| format!("reading {}", xyz.display()))?;
    Ok(Universe::from(xyz).with_basis_set(basis_set))
}

fn load_params(path: Option<&PathBuf>) -> anyhow::Result<FieldParams> {
    Ok(match path {
        Some(path) => {
            let config: ConfigFieldParams = serde_json::from_reader(BufReader::new(
                File::open(path).with_context(|| format!("opening {}", path.display()))?,
            ))?;
            FieldParams::from(config)
        }
        None => FieldParams::cube(-8.0, 8.0, 41),
    })
}

fn write_fields(output: Option<PathBuf>, fields: &FieldGrid) -> anyhow::Result<()> {
    if let Some(output) = output {
        serde_json::to_writer(File::create(&output)?, fields)
            .with_context(|| format!("writing {}", output.display()))?;
    }
    Ok(())
}

fn write_json(value: &impl Serialize, pretty: bool) -> anyhow::Result<()> {
    let stdout = io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(stdout, value)?;
    } else {
        serde_json::to_writer(stdout, value)?;
    }
    println!();
    Ok(())
}
