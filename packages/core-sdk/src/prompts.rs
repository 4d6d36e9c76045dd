use crate::models::PhotoKind;

/** \brief 资产整体照片的状况评估模板。 */
pub const ASSET_PHOTO_PROMPT: &str = r#"You are a professional asset appraiser and equipment inspector. Analyze this asset image and provide a detailed assessment.

INSPECTION CRITERIA:
1. PHYSICAL CONDITION: Look for rust, dents, scratches, wear patterns, missing parts, fluid leaks
2. OPERATIONAL STATUS: Assess if equipment appears functional, well-maintained, or needs repair
3. SAFETY CONCERNS: Identify any visible safety hazards or compliance issues
4. MARKET VALUE: Consider age indicators, brand recognition, model type, and condition impact on value

ANALYSIS REQUIREMENTS:
- Be specific about what you observe (e.g., "minor surface rust on left side panel" not just "some wear")
- Categorize condition as: Excellent, Good, Fair, Poor, or Salvage
- Provide value range if uncertain (e.g., "$15,000-$20,000")
- Note any maintenance recommendations
- Identify the asset type and key features you can see

RESPONSE FORMAT:
Return a JSON object with these exact properties:
{
  "condition": "condition category with brief explanation",
  "estimatedValue": "USD value or range with reasoning",
  "assetType": "identified equipment type",
  "keyFindings": "specific observations about condition",
  "recommendations": "maintenance or action items if any"
}

If image quality is poor or asset type unclear, be honest about limitations but provide best assessment possible."#;

/** \brief 铭牌/数据板照片的字段提取模板。 */
pub const NAMEPLATE_PHOTO_PROMPT: &str = r#"You are a technical data specialist and equipment identifier. Analyze this nameplate/data plate image to extract key equipment information.

EXTRACTION CRITERIA:
1. MANUFACTURER: Brand name, company logo, manufacturer details
2. MODEL INFORMATION: Model number, part number, serial number
3. SPECIFICATIONS: Power ratings, capacity, dimensions, weight
4. MANUFACTURING DATA: Year, date codes, country of origin
5. TECHNICAL RATINGS: Voltage, amperage, pressure, flow rates, etc.
6. COMPLIANCE MARKINGS: Safety certifications, standards compliance

ANALYSIS REQUIREMENTS:
- Read all visible text accurately, including small print
- Identify partially obscured or worn text where possible
- Note any missing or illegible information
- Provide context for technical specifications
- Flag any safety or compliance certifications visible

RESPONSE FORMAT:
Return a JSON object with these exact properties:
{
  "manufacturer": "brand/company name if visible",
  "modelNumber": "model/part number if visible",
  "serialNumber": "serial number if visible",
  "specifications": "key technical specs and ratings",
  "keyFindings": "all readable text and important markings",
  "dataQuality": "assessment of nameplate readability and condition"
}

If text is unclear or partially obscured, indicate uncertainty but provide best reading possible."#;

/**
 * \brief 按照片类型选取提示词模板。
 */
pub fn select_prompt(kind: PhotoKind) -> &'static str {
    match kind {
        PhotoKind::Nameplate => NAMEPLATE_PHOTO_PROMPT,
        PhotoKind::Asset => ASSET_PHOTO_PROMPT,
    }
}
