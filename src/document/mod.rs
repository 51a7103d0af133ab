/*!
 * Word document model and package I/O.
 *
 * - `model`: paragraphs, runs, tables and cells
 * - `xml`: WordprocessingML reader and writer for the main document part
 * - `package`: the `.docx` ZIP container
 */

pub mod model;
pub mod package;
mod xml;

pub use model::{Alignment, Document, DocumentShape, Paragraph, Run, RunFormatting, Table, TableCell, TableRow};
pub use package::{DEFAULT_MAIN_PART, DocxPackage};
