use super::schema::ServiceInput;

const TEMPLATE: &str = "You are a helpful backend assistant. Process the following query and provide a response.\nQuery: {query}\n";

/// Fills the fixed prompt template with the query, verbatim.
pub fn render(input: &ServiceInput) -> String {
    TEMPLATE.replacen("{query}", input.query(), 1)
}
