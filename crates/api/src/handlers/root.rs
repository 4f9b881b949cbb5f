/// GET /
///
/// Plain-text description of the service.
pub async fn index() -> &'static str {
    "This service gives information about developments related to renewable energy \
     production for and across countries.\n\
     Endpoints:\n  \
     /energy/v1/renewables/current/{country?}\n  \
     /energy/v1/renewables/history/{country?}\n  \
     /energy/v1/notification/{id?}\n  \
     /energy/v1/status\n"
}
