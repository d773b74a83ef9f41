use gedgraph::query::{path, relationship, Filter};
use gedgraph::{Gedcom, GedcomError, GraphBuilderOptions, ParseOptions};
use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Debug, Default)]
struct CliArgs {
    filename: Option<String>,
    individual_xref: Option<String>,
    individual_lastname: Option<String>,
    individual_firstname: Option<String>,
    relationship: Option<(String, String)>,
    path: Option<(String, String)>,
    validate: bool,
    validation_level: Option<ValidationLevel>,
    stats: bool,
    help: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValidationLevel {
    Strict,
    Lenient,
}

impl ValidationLevel {
    fn as_str(self) -> &'static str {
        match self {
            ValidationLevel::Strict => "strict",
            ValidationLevel::Lenient => "lenient",
        }
    }
}

impl std::str::FromStr for ValidationLevel {
    type Err = String;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "strict" => Ok(ValidationLevel::Strict),
            "lenient" => Ok(ValidationLevel::Lenient),
            _ => Err(format!(
                "Unknown validation level: {input} (expected: strict or lenient)"
            )),
        }
    }
}

fn print_help() {
    println!(
        "gedgraph - GEDCOM inspection and genealogy query tool\n\
\n\
USAGE:\n\
  gedgraph <file.ged>\n\
  gedgraph --individual <XREF> <file.ged>\n\
  gedgraph --individual-lastname <LASTNAME> <file.ged>\n\
  gedgraph --individual-firstname <FIRSTNAME> <file.ged>\n\
  gedgraph --relationship <XREF1> <XREF2> <file.ged>\n\
  gedgraph --path <XREF1> <XREF2> <file.ged>\n\
  gedgraph --stats <file.ged>\n\
  gedgraph --validate <file.ged>\n\
  gedgraph --validate --validation-level strict <file.ged>\n\
\n\
OPTIONS:\n\
  -h, --help                        Print this help\n\
  --individual <XREF>               Display a single individual (e.g. @I1@)\n\
  --individual-lastname <LASTNAME>  Filter individuals by last name (case-insensitive)\n\
  --individual-firstname <FIRSTNAME> Filter individuals by first name (case-insensitive)\n\
  --relationship <XREF1> <XREF2>    Classify the relationship from XREF1 to XREF2\n\
  --path <XREF1> <XREF2>            Print the shortest family path between two individuals\n\
  --stats                           Print graph-wide metrics (degree, density, components)\n\
  --validate                        Validate GEDCOM compliance and output a report\n\
  --validation-level <LEVEL>        Validation level: strict or lenient (default: lenient)\n\
\n\
NOTES:\n\
  If both --individual-lastname and --individual-firstname are set,\n\
  individuals matching BOTH filters are listed.\n"
    );
}

fn parse_args(argv: &[String]) -> Result<CliArgs, CliError> {
    let mut out = CliArgs::default();

    let mut i = 1;
    while i < argv.len() {
        match argv[i].as_str() {
            "-h" | "--help" => {
                out.help = true;
                i += 1;
            }
            "--individual" => {
                let xref = argv
                    .get(i + 1)
                    .ok_or_else(|| CliError::Usage("--individual expects an XREF".to_string()))?;
                out.individual_xref = Some(xref.clone());
                i += 2;
            }
            "--individual-lastname" => {
                let val = argv.get(i + 1).ok_or_else(|| {
                    CliError::Usage("--individual-lastname expects a LASTNAME".to_string())
                })?;
                out.individual_lastname = Some(val.clone());
                i += 2;
            }
            "--individual-firstname" => {
                let val = argv.get(i + 1).ok_or_else(|| {
                    CliError::Usage("--individual-firstname expects a FIRSTNAME".to_string())
                })?;
                out.individual_firstname = Some(val.clone());
                i += 2;
            }
            "--relationship" => {
                let a = argv
                    .get(i + 1)
                    .ok_or_else(|| CliError::Usage("--relationship expects two XREFs".to_string()))?;
                let b = argv
                    .get(i + 2)
                    .ok_or_else(|| CliError::Usage("--relationship expects two XREFs".to_string()))?;
                out.relationship = Some((a.clone(), b.clone()));
                i += 3;
            }
            "--path" => {
                let a = argv
                    .get(i + 1)
                    .ok_or_else(|| CliError::Usage("--path expects two XREFs".to_string()))?;
                let b = argv
                    .get(i + 2)
                    .ok_or_else(|| CliError::Usage("--path expects two XREFs".to_string()))?;
                out.path = Some((a.clone(), b.clone()));
                i += 3;
            }
            "--stats" => {
                out.stats = true;
                i += 1;
            }
            "--validate" => {
                out.validate = true;
                i += 1;
            }
            "--validation-level" => {
                let val = argv.get(i + 1).ok_or_else(|| {
                    CliError::Usage("--validation-level expects strict or lenient".to_string())
                })?;
                let level = val.parse::<ValidationLevel>().map_err(CliError::Usage)?;
                out.validation_level = Some(level);
                i += 2;
            }
            other if other.starts_with('-') => {
                return Err(CliError::Usage(format!("Unknown option: {other}")));
            }
            value => {
                if out.filename.is_some() {
                    return Err(CliError::Usage(format!(
                        "Found more args than expected: {:?}\n\
\
Hint: this tool expects exactly one .ged file path (quote it if it contains spaces), for example:\n\
  gedgraph --individual-lastname \"Doe\" \"/path/with spaces/family.ged\"",
                        &argv[1..]
                    )));
                }
                out.filename = Some(value.to_string());
                i += 1;
            }
        }
    }

    Ok(out)
}

#[derive(Debug)]
enum CliError {
    Io(std::io::Error),
    Gedcom(GedcomError),
    Usage(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CliError::Io(err) => write!(f, "IO error: {err}"),
            CliError::Gedcom(err) => write!(f, "Gedcom error: {err}"),
            CliError::Usage(msg) => write!(f, "Usage error: {msg}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<GedcomError> for CliError {
    fn from(err: GedcomError) -> Self {
        CliError::Gedcom(err)
    }
}

fn main() {
    match run() {
        Ok(RunOutcome::Success) => {
            process::exit(0);
        }
        Ok(RunOutcome::ValidationFailed) => {
            process::exit(2);
        }
        Err(e) => {
            let exit_code = match &e {
                CliError::Io(_) => 1,
                CliError::Gedcom(_) => 2,
                CliError::Usage(_) => 3,
            };
            eprintln!("Error: {e}");
            process::exit(exit_code);
        }
    }
}

#[derive(Debug)]
enum RunOutcome {
    Success,
    ValidationFailed,
}

fn run() -> Result<RunOutcome, CliError> {
    let argv: Vec<String> = env::args().collect();
    let args = parse_args(&argv)?;

    if args.help {
        print_help();
        process::exit(0);
    }

    let filename = args
        .filename
        .as_deref()
        .ok_or_else(|| CliError::Usage("Missing filename.".to_string()))?;

    let contents = read_relative(filename)?;

    if !args.validate && args.validation_level.is_some() {
        return Err(CliError::Usage(
            "--validation-level requires --validate".to_string(),
        ));
    }

    if args.validate {
        let validation_level = args.validation_level.unwrap_or(ValidationLevel::Lenient);
        let parse_options = ParseOptions::new().strict_mode(validation_level == ValidationLevel::Strict);
        let build_options = GraphBuilderOptions::new()
            .validate_references(true)
            .ignore_unknown_tags(validation_level != ValidationLevel::Strict);

        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        match Gedcom::parse(&contents, &parse_options) {
            Ok(gedcom) => {
                warnings.extend(gedcom.warnings.iter().map(ToString::to_string));
                let (_, build_warnings) = gedcom.build_graph(&build_options);
                warnings.extend(build_warnings.iter().map(ToString::to_string));
            }
            Err(err) => errors.push(err.to_string()),
        }

        print_validation_report(validation_level, &errors, &warnings);
        if errors.is_empty() {
            return Ok(RunOutcome::Success);
        }
        return Ok(RunOutcome::ValidationFailed);
    }

    let gedcom = Gedcom::parse(&contents, &ParseOptions::new())?;
    let (graph, _warnings) = gedcom.build_graph(&GraphBuilderOptions::new());

    if let Some(xref) = args.individual_xref.as_deref() {
        return match graph.get_by_xref(xref) {
            Some(node) => {
                println!("{node:#?}");
                Ok(RunOutcome::Success)
            }
            None => Err(CliError::Usage(format!("Individual not found: {xref}"))),
        };
    }

    if let Some((a, b)) = &args.relationship {
        let id_a = resolve_xref(&graph, a)?;
        let id_b = resolve_xref(&graph, b)?;
        println!("{:?}", relationship::classify(&graph, id_a, id_b));
        return Ok(RunOutcome::Success);
    }

    if let Some((a, b)) = &args.path {
        let id_a = resolve_xref(&graph, a)?;
        let id_b = resolve_xref(&graph, b)?;
        match path::shortest_path(&graph, id_a, id_b) {
            Some((steps, kind)) => {
                let xrefs: Vec<String> = steps
                    .iter()
                    .filter_map(|&id| graph.get_by_id(id).map(|n| n.xref))
                    .collect();
                println!("{} ({kind:?})", xrefs.join(" -> "));
            }
            None => println!("no path found"),
        }
        return Ok(RunOutcome::Success);
    }

    if args.stats {
        print_stats(&graph);
        return Ok(RunOutcome::Success);
    }

    if args.individual_lastname.is_some() || args.individual_firstname.is_some() {
        let mut filter = Filter::new();
        if let Some(last) = &args.individual_lastname {
            filter = filter.name_prefix(last.clone());
        }
        let ids = filter.execute(&graph);
        for id in ids {
            if let Some(node) = graph.get_by_id(id) {
                if matches_firstname(&node, args.individual_firstname.as_deref()) {
                    println!("{node:#?}");
                }
            }
        }
        return Ok(RunOutcome::Success);
    }

    println!(
        "parsed {} nodes, {} edges from {filename}",
        graph.node_count(),
        graph.edge_count()
    );

    Ok(RunOutcome::Success)
}

fn resolve_xref(graph: &gedgraph::Graph, xref: &str) -> Result<u32, CliError> {
    graph
        .id_for_xref(xref)
        .ok_or_else(|| CliError::Usage(format!("Individual not found: {xref}")))
}

fn matches_firstname(node: &gedgraph::Node, firstname: Option<&str>) -> bool {
    let Some(firstname) = firstname else {
        return true;
    };
    let gedgraph::NodeData::Individual(data) = &node.data else {
        return false;
    };
    data.name
        .as_deref()
        .map(|n| n.to_lowercase().contains(&firstname.to_lowercase()))
        .unwrap_or(false)
}

fn print_stats(graph: &gedgraph::Graph) {
    use gedgraph::metrics;
    println!("nodes: {}", graph.node_count());
    println!("edges: {}", graph.edge_count());
    println!("average degree: {:.2}", metrics::average_degree(graph));
    println!("density: {:.4}", metrics::density(graph));
    let components = metrics::connected_components(graph, None).into_inner();
    println!("connected components: {}", components.len());
    if let Some((distance, _)) = metrics::diameter(graph, None).into_inner() {
        println!("diameter: {distance}");
    }
}

fn print_validation_report(level: ValidationLevel, errors: &[String], warnings: &[String]) {
    println!(
        "Validation: {} - errors: {}, warnings: {}",
        level.as_str(),
        errors.len(),
        warnings.len()
    );

    for err in errors {
        println!("error: {err}");
    }

    for warning in warnings {
        println!("warning: {warning}");
    }
}

fn read_relative(path: &str) -> Result<String, std::io::Error> {
    let path_buf: PathBuf = PathBuf::from(path);
    let absolute_path: PathBuf = fs::canonicalize(path_buf)?;
    fs::read_to_string(absolute_path)
}
