//! ISO 3166-1 country table served by the dependencies endpoint and used to
//! validate company countries.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Country {
    pub alpha2: &'static str,
    pub alpha3: &'static str,
    pub numeric_code: &'static str,
    pub short_name: &'static str,
}

impl Country {
    const fn new(
        alpha2: &'static str,
        alpha3: &'static str,
        numeric_code: &'static str,
        short_name: &'static str,
    ) -> Self {
        Self {
            alpha2,
            alpha3,
            numeric_code,
            short_name,
        }
    }
}

/// Sorted by alpha-2 code.
pub static COUNTRIES: &[Country] = &[
    Country::new("AD", "AND", "020", "Andorra"),
    Country::new("AE", "ARE", "784", "United Arab Emirates"),
    Country::new("AF", "AFG", "004", "Afghanistan"),
    Country::new("AG", "ATG", "028", "Antigua and Barbuda"),
    Country::new("AI", "AIA", "660", "Anguilla"),
    Country::new("AL", "ALB", "008", "Albania"),
    Country::new("AM", "ARM", "051", "Armenia"),
    Country::new("AO", "AGO", "024", "Angola"),
    Country::new("AQ", "ATA", "010", "Antarctica"),
    Country::new("AR", "ARG", "032", "Argentina"),
    Country::new("AS", "ASM", "016", "American Samoa"),
    Country::new("AT", "AUT", "040", "Austria"),
    Country::new("AU", "AUS", "036", "Australia"),
    Country::new("AW", "ABW", "533", "Aruba"),
    Country::new("AX", "ALA", "248", "Åland Islands"),
    Country::new("AZ", "AZE", "031", "Azerbaijan"),
    Country::new("BA", "BIH", "070", "Bosnia and Herzegovina"),
    Country::new("BB", "BRB", "052", "Barbados"),
    Country::new("BD", "BGD", "050", "Bangladesh"),
    Country::new("BE", "BEL", "056", "Belgium"),
    Country::new("BF", "BFA", "854", "Burkina Faso"),
    Country::new("BG", "BGR", "100", "Bulgaria"),
    Country::new("BH", "BHR", "048", "Bahrain"),
    Country::new("BI", "BDI", "108", "Burundi"),
    Country::new("BJ", "BEN", "204", "Benin"),
    Country::new("BL", "BLM", "652", "Saint Barthélemy"),
    Country::new("BM", "BMU", "060", "Bermuda"),
    Country::new("BN", "BRN", "096", "Brunei Darussalam"),
    Country::new("BO", "BOL", "068", "Bolivia, Plurinational State of"),
    Country::new("BQ", "BES", "535", "Bonaire, Sint Eustatius and Saba"),
    Country::new("BR", "BRA", "076", "Brazil"),
    Country::new("BS", "BHS", "044", "Bahamas"),
    Country::new("BT", "BTN", "064", "Bhutan"),
    Country::new("BV", "BVT", "074", "Bouvet Island"),
    Country::new("BW", "BWA", "072", "Botswana"),
    Country::new("BY", "BLR", "112", "Belarus"),
    Country::new("BZ", "BLZ", "084", "Belize"),
    Country::new("CA", "CAN", "124", "Canada"),
    Country::new("CC", "CCK", "166", "Cocos (Keeling) Islands"),
    Country::new("CD", "COD", "180", "Congo, The Democratic Republic of the"),
    Country::new("CF", "CAF", "140", "Central African Republic"),
    Country::new("CG", "COG", "178", "Congo"),
    Country::new("CH", "CHE", "756", "Switzerland"),
    Country::new("CI", "CIV", "384", "Côte d'Ivoire"),
    Country::new("CK", "COK", "184", "Cook Islands"),
    Country::new("CL", "CHL", "152", "Chile"),
    Country::new("CM", "CMR", "120", "Cameroon"),
    Country::new("CN", "CHN", "156", "China"),
    Country::new("CO", "COL", "170", "Colombia"),
    Country::new("CR", "CRI", "188", "Costa Rica"),
    Country::new("CU", "CUB", "192", "Cuba"),
    Country::new("CV", "CPV", "132", "Cabo Verde"),
    Country::new("CW", "CUW", "531", "Curaçao"),
    Country::new("CX", "CXR", "162", "Christmas Island"),
    Country::new("CY", "CYP", "196", "Cyprus"),
    Country::new("CZ", "CZE", "203", "Czechia"),
    Country::new("DE", "DEU", "276", "Germany"),
    Country::new("DJ", "DJI", "262", "Djibouti"),
    Country::new("DK", "DNK", "208", "Denmark"),
    Country::new("DM", "DMA", "212", "Dominica"),
    Country::new("DO", "DOM", "214", "Dominican Republic"),
    Country::new("DZ", "DZA", "012", "Algeria"),
    Country::new("EC", "ECU", "218", "Ecuador"),
    Country::new("EE", "EST", "233", "Estonia"),
    Country::new("EG", "EGY", "818", "Egypt"),
    Country::new("EH", "ESH", "732", "Western Sahara"),
    Country::new("ER", "ERI", "232", "Eritrea"),
    Country::new("ES", "ESP", "724", "Spain"),
    Country::new("ET", "ETH", "231", "Ethiopia"),
    Country::new("FI", "FIN", "246", "Finland"),
    Country::new("FJ", "FJI", "242", "Fiji"),
    Country::new("FK", "FLK", "238", "Falkland Islands (Malvinas)"),
    Country::new("FM", "FSM", "583", "Micronesia, Federated States of"),
    Country::new("FO", "FRO", "234", "Faroe Islands"),
    Country::new("FR", "FRA", "250", "France"),
    Country::new("GA", "GAB", "266", "Gabon"),
    Country::new("GB", "GBR", "826", "United Kingdom"),
    Country::new("GD", "GRD", "308", "Grenada"),
    Country::new("GE", "GEO", "268", "Georgia"),
    Country::new("GF", "GUF", "254", "French Guiana"),
    Country::new("GG", "GGY", "831", "Guernsey"),
    Country::new("GH", "GHA", "288", "Ghana"),
    Country::new("GI", "GIB", "292", "Gibraltar"),
    Country::new("GL", "GRL", "304", "Greenland"),
    Country::new("GM", "GMB", "270", "Gambia"),
    Country::new("GN", "GIN", "324", "Guinea"),
    Country::new("GP", "GLP", "312", "Guadeloupe"),
    Country::new("GQ", "GNQ", "226", "Equatorial Guinea"),
    Country::new("GR", "GRC", "300", "Greece"),
    Country::new("GS", "SGS", "239", "South Georgia and the South Sandwich Islands"),
    Country::new("GT", "GTM", "320", "Guatemala"),
    Country::new("GU", "GUM", "316", "Guam"),
    Country::new("GW", "GNB", "624", "Guinea-Bissau"),
    Country::new("GY", "GUY", "328", "Guyana"),
    Country::new("HK", "HKG", "344", "Hong Kong"),
    Country::new("HM", "HMD", "334", "Heard Island and McDonald Islands"),
    Country::new("HN", "HND", "340", "Honduras"),
    Country::new("HR", "HRV", "191", "Croatia"),
    Country::new("HT", "HTI", "332", "Haiti"),
    Country::new("HU", "HUN", "348", "Hungary"),
    Country::new("ID", "IDN", "360", "Indonesia"),
    Country::new("IE", "IRL", "372", "Ireland"),
    Country::new("IL", "ISR", "376", "Israel"),
    Country::new("IM", "IMN", "833", "Isle of Man"),
    Country::new("IN", "IND", "356", "India"),
    Country::new("IO", "IOT", "086", "British Indian Ocean Territory"),
    Country::new("IQ", "IRQ", "368", "Iraq"),
    Country::new("IR", "IRN", "364", "Iran, Islamic Republic of"),
    Country::new("IS", "ISL", "352", "Iceland"),
    Country::new("IT", "ITA", "380", "Italy"),
    Country::new("JE", "JEY", "832", "Jersey"),
    Country::new("JM", "JAM", "388", "Jamaica"),
    Country::new("JO", "JOR", "400", "Jordan"),
    Country::new("JP", "JPN", "392", "Japan"),
    Country::new("KE", "KEN", "404", "Kenya"),
    Country::new("KG", "KGZ", "417", "Kyrgyzstan"),
    Country::new("KH", "KHM", "116", "Cambodia"),
    Country::new("KI", "KIR", "296", "Kiribati"),
    Country::new("KM", "COM", "174", "Comoros"),
    Country::new("KN", "KNA", "659", "Saint Kitts and Nevis"),
    Country::new("KP", "PRK", "408", "Korea, Democratic People's Republic of"),
    Country::new("KR", "KOR", "410", "Korea, Republic of"),
    Country::new("KW", "KWT", "414", "Kuwait"),
    Country::new("KY", "CYM", "136", "Cayman Islands"),
    Country::new("KZ", "KAZ", "398", "Kazakhstan"),
    Country::new("LA", "LAO", "418", "Lao People's Democratic Republic"),
    Country::new("LB", "LBN", "422", "Lebanon"),
    Country::new("LC", "LCA", "662", "Saint Lucia"),
    Country::new("LI", "LIE", "438", "Liechtenstein"),
    Country::new("LK", "LKA", "144", "Sri Lanka"),
    Country::new("LR", "LBR", "430", "Liberia"),
    Country::new("LS", "LSO", "426", "Lesotho"),
    Country::new("LT", "LTU", "440", "Lithuania"),
    Country::new("LU", "LUX", "442", "Luxembourg"),
    Country::new("LV", "LVA", "428", "Latvia"),
    Country::new("LY", "LBY", "434", "Libya"),
    Country::new("MA", "MAR", "504", "Morocco"),
    Country::new("MC", "MCO", "492", "Monaco"),
    Country::new("MD", "MDA", "498", "Moldova, Republic of"),
    Country::new("ME", "MNE", "499", "Montenegro"),
    Country::new("MF", "MAF", "663", "Saint Martin (French part)"),
    Country::new("MG", "MDG", "450", "Madagascar"),
    Country::new("MH", "MHL", "584", "Marshall Islands"),
    Country::new("MK", "MKD", "807", "North Macedonia"),
    Country::new("ML", "MLI", "466", "Mali"),
    Country::new("MM", "MMR", "104", "Myanmar"),
    Country::new("MN", "MNG", "496", "Mongolia"),
    Country::new("MO", "MAC", "446", "Macao"),
    Country::new("MP", "MNP", "580", "Northern Mariana Islands"),
    Country::new("MQ", "MTQ", "474", "Martinique"),
    Country::new("MR", "MRT", "478", "Mauritania"),
    Country::new("MS", "MSR", "500", "Montserrat"),
    Country::new("MT", "MLT", "470", "Malta"),
    Country::new("MU", "MUS", "480", "Mauritius"),
    Country::new("MV", "MDV", "462", "Maldives"),
    Country::new("MW", "MWI", "454", "Malawi"),
    Country::new("MX", "MEX", "484", "Mexico"),
    Country::new("MY", "MYS", "458", "Malaysia"),
    Country::new("MZ", "MOZ", "508", "Mozambique"),
    Country::new("NA", "NAM", "516", "Namibia"),
    Country::new("NC", "NCL", "540", "New Caledonia"),
    Country::new("NE", "NER", "562", "Niger"),
    Country::new("NF", "NFK", "574", "Norfolk Island"),
    Country::new("NG", "NGA", "566", "Nigeria"),
    Country::new("NI", "NIC", "558", "Nicaragua"),
    Country::new("NL", "NLD", "528", "Netherlands"),
    Country::new("NO", "NOR", "578", "Norway"),
    Country::new("NP", "NPL", "524", "Nepal"),
    Country::new("NR", "NRU", "520", "Nauru"),
    Country::new("NU", "NIU", "570", "Niue"),
    Country::new("NZ", "NZL", "554", "New Zealand"),
    Country::new("OM", "OMN", "512", "Oman"),
    Country::new("PA", "PAN", "591", "Panama"),
    Country::new("PE", "PER", "604", "Peru"),
    Country::new("PF", "PYF", "258", "French Polynesia"),
    Country::new("PG", "PNG", "598", "Papua New Guinea"),
    Country::new("PH", "PHL", "608", "Philippines"),
    Country::new("PK", "PAK", "586", "Pakistan"),
    Country::new("PL", "POL", "616", "Poland"),
    Country::new("PM", "SPM", "666", "Saint Pierre and Miquelon"),
    Country::new("PN", "PCN", "612", "Pitcairn"),
    Country::new("PR", "PRI", "630", "Puerto Rico"),
    Country::new("PS", "PSE", "275", "Palestine, State of"),
    Country::new("PT", "PRT", "620", "Portugal"),
    Country::new("PW", "PLW", "585", "Palau"),
    Country::new("PY", "PRY", "600", "Paraguay"),
    Country::new("QA", "QAT", "634", "Qatar"),
    Country::new("RE", "REU", "638", "Réunion"),
    Country::new("RO", "ROU", "642", "Romania"),
    Country::new("RS", "SRB", "688", "Serbia"),
    Country::new("RU", "RUS", "643", "Russian Federation"),
    Country::new("RW", "RWA", "646", "Rwanda"),
    Country::new("SA", "SAU", "682", "Saudi Arabia"),
    Country::new("SB", "SLB", "090", "Solomon Islands"),
    Country::new("SC", "SYC", "690", "Seychelles"),
    Country::new("SD", "SDN", "729", "Sudan"),
    Country::new("SE", "SWE", "752", "Sweden"),
    Country::new("SG", "SGP", "702", "Singapore"),
    Country::new("SH", "SHN", "654", "Saint Helena, Ascension and Tristan da Cunha"),
    Country::new("SI", "SVN", "705", "Slovenia"),
    Country::new("SJ", "SJM", "744", "Svalbard and Jan Mayen"),
    Country::new("SK", "SVK", "703", "Slovakia"),
    Country::new("SL", "SLE", "694", "Sierra Leone"),
    Country::new("SM", "SMR", "674", "San Marino"),
    Country::new("SN", "SEN", "686", "Senegal"),
    Country::new("SO", "SOM", "706", "Somalia"),
    Country::new("SR", "SUR", "740", "Suriname"),
    Country::new("SS", "SSD", "728", "South Sudan"),
    Country::new("ST", "STP", "678", "Sao Tome and Principe"),
    Country::new("SV", "SLV", "222", "El Salvador"),
    Country::new("SX", "SXM", "534", "Sint Maarten (Dutch part)"),
    Country::new("SY", "SYR", "760", "Syrian Arab Republic"),
    Country::new("SZ", "SWZ", "748", "Eswatini"),
    Country::new("TC", "TCA", "796", "Turks and Caicos Islands"),
    Country::new("TD", "TCD", "148", "Chad"),
    Country::new("TF", "ATF", "260", "French Southern Territories"),
    Country::new("TG", "TGO", "768", "Togo"),
    Country::new("TH", "THA", "764", "Thailand"),
    Country::new("TJ", "TJK", "762", "Tajikistan"),
    Country::new("TK", "TKL", "772", "Tokelau"),
    Country::new("TL", "TLS", "626", "Timor-Leste"),
    Country::new("TM", "TKM", "795", "Turkmenistan"),
    Country::new("TN", "TUN", "788", "Tunisia"),
    Country::new("TO", "TON", "776", "Tonga"),
    Country::new("TR", "TUR", "792", "Türkiye"),
    Country::new("TT", "TTO", "780", "Trinidad and Tobago"),
    Country::new("TV", "TUV", "798", "Tuvalu"),
    Country::new("TW", "TWN", "158", "Taiwan, Province of China"),
    Country::new("TZ", "TZA", "834", "Tanzania, United Republic of"),
    Country::new("UA", "UKR", "804", "Ukraine"),
    Country::new("UG", "UGA", "800", "Uganda"),
    Country::new("UM", "UMI", "581", "United States Minor Outlying Islands"),
    Country::new("US", "USA", "840", "United States"),
    Country::new("UY", "URY", "858", "Uruguay"),
    Country::new("UZ", "UZB", "860", "Uzbekistan"),
    Country::new("VA", "VAT", "336", "Holy See (Vatican City State)"),
    Country::new("VC", "VCT", "670", "Saint Vincent and the Grenadines"),
    Country::new("VE", "VEN", "862", "Venezuela, Bolivarian Republic of"),
    Country::new("VG", "VGB", "092", "Virgin Islands, British"),
    Country::new("VI", "VIR", "850", "Virgin Islands, U.S."),
    Country::new("VN", "VNM", "704", "Viet Nam"),
    Country::new("VU", "VUT", "548", "Vanuatu"),
    Country::new("WF", "WLF", "876", "Wallis and Futuna"),
    Country::new("WS", "WSM", "882", "Samoa"),
    Country::new("YE", "YEM", "887", "Yemen"),
    Country::new("YT", "MYT", "175", "Mayotte"),
    Country::new("ZA", "ZAF", "710", "South Africa"),
    Country::new("ZM", "ZMB", "894", "Zambia"),
    Country::new("ZW", "ZWE", "716", "Zimbabwe"),
];

/// Case-insensitive lookup by alpha-2 code.
pub fn find_country(alpha2: &str) -> Option<&'static Country> {
    let code = alpha2.trim().to_ascii_uppercase();
    COUNTRIES
        .binary_search_by(|c| c.alpha2.cmp(code.as_str()))
        .ok()
        .map(|i| &COUNTRIES[i])
}
