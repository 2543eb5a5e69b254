use forecast_core::{AppState, Notice};

/// Print notices the way the page would show them. Returns the first alert,
/// if any, so one-shot commands can fail on it.
pub fn render(notices: &[Notice]) -> Option<String> {
    let mut alert = None;

    for notice in notices {
        match notice {
            Notice::Forecast(text) => println!("{text}"),
            Notice::Status(msg) => eprintln!("{msg}"),
            Notice::GeoNote(note) => eprintln!("Note: {note}"),
            Notice::TipMessage(msg) => eprintln!("{msg}"),
            Notice::FallbackLink(link) => eprintln!("{link}"),
            Notice::Alert(msg) => {
                eprintln!("! {msg}");
                alert.get_or_insert_with(|| msg.clone());
            }
        }
    }

    alert
}

pub fn print_location(state: &AppState) {
    let coordinates = state.coordinates_display();
    let address = state.address_display();
    eprintln!("Lat/Lon: {}", if coordinates.is_empty() { "-" } else { coordinates.as_str() });
    eprintln!("Address: {}", if address.is_empty() { "-" } else { address });
    eprintln!("Date:    {}", state.date.format("%Y-%m-%d"));
    eprintln!("Source:  {}", state.source);
}
