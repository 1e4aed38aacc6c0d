#[macro_use]
extern crate afl;
extern crate rsax;

use rsax::{Event, EventCollector, SaxOptions, SaxParser};

fn parse_chunked(opts: &SaxOptions, chunks: &[&str]) -> Vec<Event> {
	let mut parser = SaxParser::with_options(opts.clone(), EventCollector::new());
	for chunk in chunks {
		if parser.write(chunk).is_err() {
			parser.resume();
		}
	}
	let _ = parser.close();
	parser.into_sink().into_events()
}

fn main() {
	fuzz!(|data: &[u8]| {
		let data = match std::str::from_utf8(data) {
			Ok(s) => s,
			Err(_) => return,
		};
		// NUL separates chunks; empty chunks would end the document early
		let chunks: Vec<&str> = data.split('\0').filter(|c| !c.is_empty()).collect();
		let whole = chunks.concat();

		for opts in [
			SaxOptions::default(),
			SaxOptions::default().strict(true).xmlns(true),
			SaxOptions::default().max_buffer_length(16),
		]
		.iter()
		{
			let split = parse_chunked(opts, &chunks);
			let joined = parse_chunked(opts, &[&whole]);
			if split != joined {
				panic!("events depend on chunking")
			}
		}
	});
}
