//! Fixed texts shared by the PDF and DOCX reports.

pub const NO_IMAGE: &str = "No image";

pub const DECLARATION: &str = "I declare under oath that I have carefully reviewed the information \
listed in this document and that it corresponds to the data and documents submitted by each \
player. I take responsibility for immediately reporting any change or correction that must be \
made, and I understand that the use of false or incomplete information may lead to sanctions by \
the tournament organization.";

pub const SIGNATURE_RULE: &str = "_______________________________";
pub const SIGNATURE_LABEL: &str = "Signature of the Team Official";
pub const OFFICIAL_NAME_LINE: &str = "Name of the Team Official: _______________________________";
pub const OFFICIAL_ID_LINE: &str = "ID of the Team Official: ________________________";

pub fn team_title(team: &str) -> String {
    format!("Team: {team}")
}
