use mapping_tools::app::export;
use mapping_tools::MappingKind;

#[tokio::main]
async fn main() {
    export::main(MappingKind::Region, "generate-region-mappings").await;
}
