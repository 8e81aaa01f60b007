//! Parse an HTML file (or stdin) and print the tree
//!
//! ```text
//! cargo run -p html --example dump -- page.html
//! cargo run -p html --example dump -- --outline --pretty < page.html
//! ```

use html::{DomSerializer, HtmlParser, SerializerConfig};
use std::io::Read;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let mut outline = false;
    let mut pretty = false;
    let mut path = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--outline" => outline = true,
            "--pretty" => pretty = true,
            _ => path = Some(arg),
        }
    }

    let bytes = match path {
        Some(path) => std::fs::read(path)?,
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };

    let text = std::str::from_utf8(&bytes)?;
    let (doc, issues) = HtmlParser::new().parse_with_issues(text)?;
    for issue in &issues {
        eprintln!("warning: {}", issue);
    }

    let serializer = DomSerializer::with_config(SerializerConfig {
        pretty,
        ..SerializerConfig::default()
    });
    if outline {
        print!("{}", serializer.outline(&doc)?);
    } else {
        println!("{}", serializer.serialize(&doc)?);
    }

    Ok(())
}
