use std::path::PathBuf;

use clap::Parser;
use fortune::{compute_with, BoundingBox, Config, Point, SiteIdx};
use kurbo::{BezPath, Shape as _};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Draws the Voronoi diagram of some random sites.
#[derive(Parser)]
struct Args {
    output: PathBuf,

    #[arg(long, default_value_t = 64)]
    sites: usize,

    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 512.0)]
    size: f64,

    #[arg(long)]
    epsilon: Option<f64>,
}

pub fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut rng = StdRng::seed_from_u64(args.seed);
    let sites: Vec<Point> = (0..args.sites)
        .map(|_| Point::new(rng.gen_range(0.0..args.size), rng.gen_range(0.0..args.size)))
        .collect();

    let bbox = BoundingBox::new(0.0, args.size, 0.0, args.size);
    let mut config = Config::default();
    if let Some(eps) = args.epsilon {
        config = config.with_epsilon(eps);
    }
    let diagram = compute_with(sites.iter().copied(), bbox, &config)?;

    let stroke_width = args.size / 512.0;
    let dot_radius = stroke_width * 1.5;
    let pad = stroke_width * 4.0;
    let mut document = svg::Document::new().set(
        "viewBox",
        (-pad, -pad, args.size + 2.0 * pad, args.size + 2.0 * pad),
    );

    for i in 0..diagram.cells.len() {
        let polygon = diagram.polygon(SiteIdx(i));
        let Some((first, rest)) = polygon.split_first() else {
            continue;
        };
        let mut outline = BezPath::new();
        outline.move_to((first.x, first.y));
        for p in rest {
            outline.line_to((p.x, p.y));
        }
        outline.close_path();

        // Bigger cells get lighter shades.
        let area = outline.area().abs() / (args.size * args.size);
        let shade = (255.0 * (1.0 - area).powi(8)) as u8;
        let path = svg::node::element::Path::new()
            .set("fill", format!("rgb({shade}, {shade}, 255)"))
            .set("stroke", "black")
            .set("stroke-width", stroke_width)
            .set("d", outline.to_svg());
        document = document.add(path);
    }

    for p in &sites {
        let c = svg::node::element::Circle::new()
            .set("cx", p.x)
            .set("cy", p.y)
            .set("r", dot_radius)
            .set("fill", "black");
        document = document.add(c);
    }

    svg::save(&args.output, &document)?;
    Ok(())
}
