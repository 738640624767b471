use ascii_table::AsciiTable;
use kernc_mir::MirModule;

/// One row per function: name, blocks, instructions, phis.
pub fn stats_rows(module: &MirModule) -> Vec<Vec<String>> {
  module
    .functions
    .iter()
    .map(|func| {
      vec![
        func.name.clone(),
        func.blocks.len().to_string(),
        func.instruction_count().to_string(),
        func.phi_count().to_string(),
      ]
    })
    .collect()
}

pub fn format_stats(module: &MirModule) -> String {
  let mut ascii_table = AsciiTable::default();
  ascii_table.column(0).set_header("Function");
  ascii_table.column(1).set_header("Blocks");
  ascii_table.column(2).set_header("Instructions");
  ascii_table.column(3).set_header("Phis");

  ascii_table.format(stats_rows(module))
}
