/// Boundary types shared with the document-fetch collaborator.
pub mod project;
